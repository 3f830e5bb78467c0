use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::UserAccount;

/// Account row plus the stored password digest. Only the identity provider
/// reads this; everything else works with [`UserAccount`].
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub account: UserAccount,
    pub password_hash: String,
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<UserAccount> {
    Ok(UserAccount {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        email_confirmed: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Insert a new account. Callers are expected to have checked for an existing
/// email first; a race still surfaces as a constraint error.
pub fn create_user(
    conn: &Connection,
    email: &str,
    display_name: &str,
    password_hash: &str,
    email_confirmed: bool,
) -> Result<UserAccount> {
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO users (email, display_name, password_hash, email_confirmed, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![email, display_name, password_hash, email_confirmed, created_at],
    )
    .context("failed to insert user")?;

    Ok(UserAccount {
        id: conn.last_insert_rowid(),
        email: email.to_string(),
        display_name: display_name.to_string(),
        email_confirmed,
        created_at,
    })
}

/// Look up an account and its password digest by email (case-insensitive).
pub fn find_credentials(conn: &Connection, email: &str) -> Result<Option<StoredCredentials>> {
    conn.query_row(
        "SELECT id, email, display_name, email_confirmed, created_at, password_hash
         FROM users WHERE email = ?1",
        params![email],
        |row| {
            Ok(StoredCredentials {
                account: account_from_row(row)?,
                password_hash: row.get(5)?,
            })
        },
    )
    .optional()
    .context("failed to query user by email")
}

/// Mark an account's email as confirmed.
pub fn confirm_email(conn: &Connection, email: &str) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE users SET email_confirmed = 1 WHERE email = ?1",
            params![email],
        )
        .context("failed to confirm email")?;

    if updated == 0 {
        Err(anyhow!("No account registered for {email}"))
    } else {
        Ok(())
    }
}
