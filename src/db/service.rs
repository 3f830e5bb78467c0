//! Service seams the UI talks to. The TUI only ever holds a
//! `Box<dyn RepertoireService>` / `Box<dyn BandService>`, so a different
//! backend can slot in without touching screens. [`SqliteStore`] is the
//! embedded implementation and publishes every successful write on its
//! [`ChangeFeed`].

use std::rc::Rc;

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use tracing::{debug, info};

use super::band;
use super::feed::{Change, ChangeFeed, ChangeKind, Scope, Subscription};
use super::repertoires;
use super::songs::{self, MoveDirection};
use crate::models::{Band, BandMember, Repertoire, Song, SongFields};

/// Repertoire and song persistence.
pub trait RepertoireService {
    /// Repertoires owned by `owner_id`, newest first.
    fn list_repertoires(&self, owner_id: i64) -> Result<Vec<Repertoire>>;
    fn create_repertoire(
        &self,
        name: &str,
        description: Option<&str>,
        owner_id: i64,
    ) -> Result<Repertoire>;
    fn rename_repertoire(&self, id: i64, name: &str, description: Option<&str>) -> Result<()>;
    /// Deletes the repertoire and all of its songs.
    fn delete_repertoire(&self, id: i64) -> Result<()>;
    /// Songs in ascending `position` order.
    fn list_songs(&self, repertoire_id: i64) -> Result<Vec<Song>>;
    /// Appends the song; its position is the current song count.
    fn create_song(&self, repertoire_id: i64, fields: &SongFields) -> Result<Song>;
    fn update_song(&self, id: i64, fields: &SongFields) -> Result<()>;
    fn delete_song(&self, id: i64) -> Result<()>;
    /// Swap with the neighbour in `direction`; `false` when already at the end.
    fn move_song(&self, id: i64, direction: MoveDirection) -> Result<bool>;
    fn subscribe(&self, scope: Scope) -> Subscription;
}

/// Band and member persistence. One band per owner.
pub trait BandService {
    fn find_band(&self, owner_id: i64) -> Result<Option<Band>>;
    /// Create the band or rename the existing one.
    fn save_band(&self, owner_id: i64, name: &str) -> Result<Band>;
    /// Removes the members, then the band.
    fn delete_band(&self, band_id: i64) -> Result<()>;
    /// Members in insertion order.
    fn list_members(&self, band_id: i64) -> Result<Vec<BandMember>>;
    fn add_member(&self, band_id: i64, name: &str, instrument: &str) -> Result<BandMember>;
    fn remove_member(&self, member_id: i64) -> Result<()>;
    fn subscribe_band(&self, owner_id: i64) -> Subscription;
}

/// SQLite-backed implementation of both services.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Rc<Connection>,
    feed: ChangeFeed,
}

impl SqliteStore {
    pub fn new(conn: Rc<Connection>, feed: ChangeFeed) -> Self {
        Self { conn, feed }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    fn notify(&self, scope: Scope, kind: ChangeKind, id: i64) {
        debug!(?scope, ?kind, id, "publishing change");
        self.feed.publish(Change::new(scope, kind, id));
    }

    fn band_owner(&self, band_id: i64) -> Result<i64> {
        band::fetch_band_by_id(&self.conn, band_id)?
            .map(|band| band.owner_id)
            .ok_or_else(|| anyhow!("Band not found"))
    }
}

impl RepertoireService for SqliteStore {
    fn list_repertoires(&self, owner_id: i64) -> Result<Vec<Repertoire>> {
        repertoires::fetch_repertoires(&self.conn, owner_id)
    }

    fn create_repertoire(
        &self,
        name: &str,
        description: Option<&str>,
        owner_id: i64,
    ) -> Result<Repertoire> {
        let repertoire = repertoires::create_repertoire(&self.conn, owner_id, name, description)?;
        info!(id = repertoire.id, owner_id, "repertoire created");
        self.notify(
            Scope::Repertoires { owner_id },
            ChangeKind::Added,
            repertoire.id,
        );
        Ok(repertoire)
    }

    fn rename_repertoire(&self, id: i64, name: &str, description: Option<&str>) -> Result<()> {
        let existing = repertoires::fetch_repertoire(&self.conn, id)?
            .ok_or_else(|| anyhow!("Repertoire not found"))?;
        repertoires::update_repertoire(&self.conn, id, name, description)?;
        self.notify(
            Scope::Repertoires {
                owner_id: existing.owner_id,
            },
            ChangeKind::Changed,
            id,
        );
        Ok(())
    }

    fn delete_repertoire(&self, id: i64) -> Result<()> {
        let existing = repertoires::fetch_repertoire(&self.conn, id)?
            .ok_or_else(|| anyhow!("Repertoire not found"))?;
        repertoires::delete_repertoire(&self.conn, id)?;
        info!(id, "repertoire deleted");
        self.notify(
            Scope::Repertoires {
                owner_id: existing.owner_id,
            },
            ChangeKind::Removed,
            id,
        );
        self.notify(Scope::Songs { repertoire_id: id }, ChangeKind::Removed, id);
        Ok(())
    }

    fn list_songs(&self, repertoire_id: i64) -> Result<Vec<Song>> {
        songs::fetch_songs(&self.conn, repertoire_id)
    }

    fn create_song(&self, repertoire_id: i64, fields: &SongFields) -> Result<Song> {
        let song = songs::create_song(&self.conn, repertoire_id, fields)?;
        debug!(id = song.id, repertoire_id, position = song.position, "song created");
        self.notify(Scope::Songs { repertoire_id }, ChangeKind::Added, song.id);
        Ok(song)
    }

    fn update_song(&self, id: i64, fields: &SongFields) -> Result<()> {
        let existing =
            songs::fetch_song(&self.conn, id)?.ok_or_else(|| anyhow!("Song not found"))?;
        songs::update_song(&self.conn, id, fields)?;
        self.notify(
            Scope::Songs {
                repertoire_id: existing.repertoire_id,
            },
            ChangeKind::Changed,
            id,
        );
        Ok(())
    }

    fn delete_song(&self, id: i64) -> Result<()> {
        let existing =
            songs::fetch_song(&self.conn, id)?.ok_or_else(|| anyhow!("Song not found"))?;
        songs::delete_song(&self.conn, id)?;
        self.notify(
            Scope::Songs {
                repertoire_id: existing.repertoire_id,
            },
            ChangeKind::Removed,
            id,
        );
        Ok(())
    }

    fn move_song(&self, id: i64, direction: MoveDirection) -> Result<bool> {
        let existing =
            songs::fetch_song(&self.conn, id)?.ok_or_else(|| anyhow!("Song not found"))?;
        let moved = songs::move_song(&self.conn, id, direction)?;
        if moved {
            self.notify(
                Scope::Songs {
                    repertoire_id: existing.repertoire_id,
                },
                ChangeKind::Changed,
                id,
            );
        }
        Ok(moved)
    }

    fn subscribe(&self, scope: Scope) -> Subscription {
        self.feed.subscribe(scope)
    }
}

impl BandService for SqliteStore {
    fn find_band(&self, owner_id: i64) -> Result<Option<Band>> {
        band::fetch_band(&self.conn, owner_id)
    }

    fn save_band(&self, owner_id: i64, name: &str) -> Result<Band> {
        let existed = band::fetch_band(&self.conn, owner_id)?.is_some();
        let saved = band::save_band(&self.conn, owner_id, name)?;
        let kind = if existed {
            ChangeKind::Changed
        } else {
            ChangeKind::Added
        };
        self.notify(Scope::Band { owner_id }, kind, saved.id);
        Ok(saved)
    }

    fn delete_band(&self, band_id: i64) -> Result<()> {
        let owner_id = self.band_owner(band_id)?;
        band::delete_band(&self.conn, band_id)?;
        info!(band_id, "band deleted");
        self.notify(Scope::Band { owner_id }, ChangeKind::Removed, band_id);
        Ok(())
    }

    fn list_members(&self, band_id: i64) -> Result<Vec<BandMember>> {
        band::fetch_members(&self.conn, band_id)
    }

    fn add_member(&self, band_id: i64, name: &str, instrument: &str) -> Result<BandMember> {
        let owner_id = self.band_owner(band_id)?;
        let member = band::create_member(&self.conn, band_id, name, instrument)?;
        self.notify(Scope::Band { owner_id }, ChangeKind::Added, member.id);
        Ok(member)
    }

    fn remove_member(&self, member_id: i64) -> Result<()> {
        let band_id = band::delete_member(&self.conn, member_id)?;
        let owner_id = self.band_owner(band_id)?;
        self.notify(Scope::Band { owner_id }, ChangeKind::Removed, member_id);
        Ok(())
    }

    fn subscribe_band(&self, owner_id: i64) -> Subscription {
        self.feed.subscribe(Scope::Band { owner_id })
    }
}
