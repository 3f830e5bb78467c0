use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Band, BandMember};

/// The band owned by `owner_id`, if one has been created.
pub fn fetch_band(conn: &Connection, owner_id: i64) -> Result<Option<Band>> {
    conn.query_row(
        "SELECT id, owner_id, name FROM bands WHERE owner_id = ?1",
        [owner_id],
        |row| {
            Ok(Band {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                name: row.get(2)?,
            })
        },
    )
    .optional()
    .context("failed to load band")
}

pub fn fetch_band_by_id(conn: &Connection, id: i64) -> Result<Option<Band>> {
    conn.query_row(
        "SELECT id, owner_id, name FROM bands WHERE id = ?1",
        [id],
        |row| {
            Ok(Band {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                name: row.get(2)?,
            })
        },
    )
    .optional()
    .context("failed to load band")
}

/// Create the owner's band or rename the existing one. Each account owns at
/// most one band, so the owner id doubles as the upsert key.
pub fn save_band(conn: &Connection, owner_id: i64, name: &str) -> Result<Band> {
    conn.execute(
        "INSERT INTO bands (owner_id, name) VALUES (?1, ?2)
         ON CONFLICT(owner_id) DO UPDATE SET name = excluded.name",
        params![owner_id, name],
    )
    .context("failed to save band")?;

    fetch_band(conn, owner_id)?.ok_or_else(|| anyhow!("Band not found after save"))
}

/// Delete the members first, then the band itself, in one transaction.
pub fn delete_band(conn: &Connection, id: i64) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to begin band transaction")?;
    tx.execute("DELETE FROM band_members WHERE band_id = ?1", [id])
        .context("failed to delete band members")?;
    let deleted = tx
        .execute("DELETE FROM bands WHERE id = ?1", [id])
        .context("failed to delete band")?;
    if deleted == 0 {
        return Err(anyhow!("Band not found"));
    }
    tx.commit().context("failed to commit band delete")
}

/// Members in the order they were added.
pub fn fetch_members(conn: &Connection, band_id: i64) -> Result<Vec<BandMember>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, band_id, name, instrument
             FROM band_members
             WHERE band_id = ?1
             ORDER BY id ASC",
        )
        .context("failed to prepare band members query")?;

    let members = stmt
        .query_map([band_id], |row| {
            Ok(BandMember {
                id: row.get(0)?,
                band_id: row.get(1)?,
                name: row.get(2)?,
                instrument: row.get(3)?,
            })
        })
        .context("failed to iterate band members")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect band members")?;

    Ok(members)
}

pub fn create_member(
    conn: &Connection,
    band_id: i64,
    name: &str,
    instrument: &str,
) -> Result<BandMember> {
    conn.execute(
        "INSERT INTO band_members (band_id, name, instrument) VALUES (?1, ?2, ?3)",
        params![band_id, name, instrument],
    )
    .context("failed to insert band member")?;

    Ok(BandMember {
        id: conn.last_insert_rowid(),
        band_id,
        name: name.to_string(),
        instrument: instrument.to_string(),
    })
}

/// Remove a member and return the band id it belonged to.
pub fn delete_member(conn: &Connection, id: i64) -> Result<i64> {
    let band_id: Option<i64> = conn
        .query_row(
            "SELECT band_id FROM band_members WHERE id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()
        .context("failed to look up band member")?;
    let band_id = band_id.ok_or_else(|| anyhow!("Band member not found"))?;

    conn.execute("DELETE FROM band_members WHERE id = ?1", [id])
        .context("failed to delete band member")?;
    Ok(band_id)
}
