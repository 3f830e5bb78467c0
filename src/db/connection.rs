use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

/// Open (or create) the database at `path`, creating parent directories as
/// needed, and run the lazy migrations.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path).context("failed to open SQLite database")?;
    ensure_schema(&conn)?;
    debug!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Private in-memory database with the full schema. Tests and throwaway
/// sessions use it.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create every table if missing. The function also toggles
/// `PRAGMA foreign_keys = ON` so cascading deletes behave the same during
/// tests and production runs.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            display_name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            email_confirmed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create users table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS repertoires (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(owner_id) REFERENCES users(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create repertoires table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            repertoire_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            artist TEXT,
            musical_key TEXT,
            chord_text TEXT,
            notes TEXT,
            position INTEGER NOT NULL,
            UNIQUE (repertoire_id, position),
            FOREIGN KEY(repertoire_id) REFERENCES repertoires(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create songs table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS bands (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL UNIQUE,
            name TEXT NOT NULL,
            FOREIGN KEY(owner_id) REFERENCES users(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create bands table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS band_members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            band_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            instrument TEXT NOT NULL,
            FOREIGN KEY(band_id) REFERENCES bands(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create band_members table")?;

    Ok(())
}
