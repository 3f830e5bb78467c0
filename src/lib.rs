//! Core library surface for the repertoire manager.
//!
//! The binary wires these pieces together; tests and other tooling can reuse
//! the store, the identity layer and the live session controller on their own.
pub mod auth;
pub mod config;
pub mod db;
pub mod live;
pub mod logging;
pub mod models;
pub mod ui;

pub use auth::{AuthContext, AuthError, LocalIdentity, Session};
pub use config::{AppPaths, Config};
pub use db::{open_database, ChangeFeed, SqliteStore};
pub use live::SessionController;
pub use models::{MusicalKey, Repertoire, Song, SongFields};
pub use ui::{run_app, App, UiSettings};
