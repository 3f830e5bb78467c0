use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{MusicalKey, Song, SongFields};

/// Which neighbour a song swaps places with when reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

const SONG_COLUMNS: &str =
    "id, repertoire_id, title, artist, musical_key, chord_text, notes, position";

fn song_from_row(row: &Row<'_>) -> rusqlite::Result<Song> {
    let key: Option<String> = row.get(4)?;
    Ok(Song {
        id: row.get(0)?,
        repertoire_id: row.get(1)?,
        title: row.get(2)?,
        artist: row.get(3)?,
        key: key.and_then(|label| label.parse::<MusicalKey>().ok()),
        chord_text: row.get(5)?,
        notes: row.get(6)?,
        position: row.get(7)?,
    })
}

/// Songs of a repertoire in performance order.
pub fn fetch_songs(conn: &Connection, repertoire_id: i64) -> Result<Vec<Song>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SONG_COLUMNS} FROM songs WHERE repertoire_id = ?1 ORDER BY position ASC"
        ))
        .context("failed to prepare repertoire songs query")?;

    let songs = stmt
        .query_map([repertoire_id], song_from_row)
        .context("failed to iterate repertoire songs")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect repertoire songs")?;

    Ok(songs)
}

pub fn fetch_song(conn: &Connection, id: i64) -> Result<Option<Song>> {
    conn.query_row(
        &format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?1"),
        [id],
        song_from_row,
    )
    .optional()
    .context("failed to load song")
}

/// Append a song to the end of a repertoire. The position is the current song
/// count, read inside the same transaction as the insert.
pub fn create_song(conn: &Connection, repertoire_id: i64, fields: &SongFields) -> Result<Song> {
    let fields = fields.normalized();
    let tx = conn
        .unchecked_transaction()
        .context("failed to begin song transaction")?;

    let position: i64 = tx
        .query_row(
            "SELECT COUNT(*) FROM songs WHERE repertoire_id = ?1",
            [repertoire_id],
            |row| row.get(0),
        )
        .context("failed to count repertoire songs")?;

    tx.execute(
        "INSERT INTO songs (repertoire_id, title, artist, musical_key, chord_text, notes, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            repertoire_id,
            fields.title,
            fields.artist,
            fields.key.map(MusicalKey::label),
            fields.chord_text,
            fields.notes,
            position
        ],
    )
    .context("failed to insert song")?;
    let id = tx.last_insert_rowid();
    tx.commit().context("failed to commit song insert")?;

    Ok(Song {
        id,
        repertoire_id,
        title: fields.title,
        artist: fields.artist,
        key: fields.key,
        chord_text: fields.chord_text,
        notes: fields.notes,
        position,
    })
}

/// Update all editable song fields. The position is untouched; reordering
/// goes through [`move_song`].
pub fn update_song(conn: &Connection, id: i64, fields: &SongFields) -> Result<()> {
    let fields = fields.normalized();
    let updated = conn
        .execute(
            "UPDATE songs
             SET title = ?1, artist = ?2, musical_key = ?3, chord_text = ?4, notes = ?5
             WHERE id = ?6",
            params![
                fields.title,
                fields.artist,
                fields.key.map(MusicalKey::label),
                fields.chord_text,
                fields.notes,
                id
            ],
        )
        .context("failed to update song")?;

    if updated == 0 {
        Err(anyhow!("Song not found"))
    } else {
        Ok(())
    }
}

/// Delete a song and close the gap it leaves so positions stay `0..count`.
///
/// SQLite checks the `(repertoire_id, position)` uniqueness row by row, so the
/// later songs are first parked on negative positions and then shifted back.
pub fn delete_song(conn: &Connection, id: i64) -> Result<()> {
    let song = fetch_song(conn, id)?.ok_or_else(|| anyhow!("Song not found"))?;
    let tx = conn
        .unchecked_transaction()
        .context("failed to begin song transaction")?;

    tx.execute("DELETE FROM songs WHERE id = ?1", [id])
        .context("failed to delete song")?;
    tx.execute(
        "UPDATE songs SET position = -position - 1
         WHERE repertoire_id = ?1 AND position > ?2",
        params![song.repertoire_id, song.position],
    )
    .context("failed to park song positions")?;
    tx.execute(
        "UPDATE songs SET position = -position - 2
         WHERE repertoire_id = ?1 AND position < 0",
        [song.repertoire_id],
    )
    .context("failed to compact song positions")?;

    tx.commit().context("failed to commit song delete")
}

/// Swap a song with its neighbour. Returns `false` when the song is already
/// first (moving up) or last (moving down).
pub fn move_song(conn: &Connection, id: i64, direction: MoveDirection) -> Result<bool> {
    let song = fetch_song(conn, id)?.ok_or_else(|| anyhow!("Song not found"))?;
    let target = match direction {
        MoveDirection::Up => song.position - 1,
        MoveDirection::Down => song.position + 1,
    };
    if target < 0 {
        return Ok(false);
    }

    let tx = conn
        .unchecked_transaction()
        .context("failed to begin reorder transaction")?;

    let neighbour: Option<i64> = tx
        .query_row(
            "SELECT id FROM songs WHERE repertoire_id = ?1 AND position = ?2",
            params![song.repertoire_id, target],
            |row| row.get(0),
        )
        .optional()
        .context("failed to find neighbouring song")?;

    let Some(neighbour_id) = neighbour else {
        return Ok(false);
    };

    tx.execute("UPDATE songs SET position = -1 WHERE id = ?1", [id])
        .context("failed to park song position")?;
    tx.execute(
        "UPDATE songs SET position = ?1 WHERE id = ?2",
        params![song.position, neighbour_id],
    )
    .context("failed to move neighbouring song")?;
    tx.execute(
        "UPDATE songs SET position = ?1 WHERE id = ?2",
        params![target, id],
    )
    .context("failed to move song")?;

    tx.commit().context("failed to commit reorder")?;
    Ok(true)
}
