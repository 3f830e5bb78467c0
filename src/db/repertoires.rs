use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::Repertoire;

fn repertoire_from_row(row: &Row<'_>) -> rusqlite::Result<Repertoire> {
    Ok(Repertoire {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Retrieve every repertoire owned by `owner_id`, newest first. Ties on the
/// timestamp fall back to the row id so freshly inserted rows still lead.
pub fn fetch_repertoires(conn: &Connection, owner_id: i64) -> Result<Vec<Repertoire>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, owner_id, name, description, created_at
             FROM repertoires
             WHERE owner_id = ?1
             ORDER BY created_at DESC, id DESC",
        )
        .context("failed to prepare repertoire query")?;

    let repertoires = stmt
        .query_map([owner_id], repertoire_from_row)
        .context("failed to load repertoires")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect repertoires")?;

    Ok(repertoires)
}

pub fn fetch_repertoire(conn: &Connection, id: i64) -> Result<Option<Repertoire>> {
    conn.query_row(
        "SELECT id, owner_id, name, description, created_at FROM repertoires WHERE id = ?1",
        [id],
        repertoire_from_row,
    )
    .optional()
    .context("failed to load repertoire")
}

/// Insert a new repertoire row, returning the hydrated struct so the caller can
/// push it straight into the in-memory list.
pub fn create_repertoire(
    conn: &Connection,
    owner_id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<Repertoire> {
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO repertoires (owner_id, name, description, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![owner_id, name, description, created_at],
    )
    .context("failed to insert repertoire")?;

    Ok(Repertoire {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        description: description.map(str::to_string),
        owner_id,
        created_at,
    })
}

/// Update the name and description of an existing repertoire.
pub fn update_repertoire(
    conn: &Connection,
    id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE repertoires SET name = ?1, description = ?2 WHERE id = ?3",
            params![name, description, id],
        )
        .context("failed to update repertoire")?;

    if updated == 0 {
        Err(anyhow!("Repertoire not found"))
    } else {
        Ok(())
    }
}

/// Remove a repertoire row. The schema cascades to `songs`, so the songs go
/// with it.
pub fn delete_repertoire(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM repertoires WHERE id = ?1", params![id])
        .context("failed to delete repertoire")?;

    if deleted == 0 {
        Err(anyhow!("Repertoire not found"))
    } else {
        Ok(())
    }
}
