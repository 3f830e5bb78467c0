//! Persistence module split across logical submodules.

mod band;
mod connection;
mod feed;
mod repertoires;
mod service;
mod songs;
mod users;

pub use band::{
    create_member, delete_band, delete_member, fetch_band, fetch_band_by_id, fetch_members,
    save_band,
};
pub use connection::{ensure_schema, open_database, open_in_memory};
pub use feed::{Change, ChangeFeed, ChangeKind, Scope, Subscription};
pub use repertoires::{
    create_repertoire, delete_repertoire, fetch_repertoire, fetch_repertoires, update_repertoire,
};
pub use service::{BandService, RepertoireService, SqliteStore};
pub use songs::{
    create_song, delete_song, fetch_song, fetch_songs, move_song, update_song, MoveDirection,
};
pub use users::{confirm_email, create_user, find_credentials, StoredCredentials};
