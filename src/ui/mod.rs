//! Ratatui front-end: sign-in, repertoire management, the band screen and
//! live performance mode.

mod app;
mod forms;
mod helpers;
mod live_view;
mod screens;
mod terminal;

pub use app::{App, UiSettings};
pub use forms::ValidationError;
pub use terminal::run_app;
