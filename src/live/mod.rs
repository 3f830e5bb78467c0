//! Live performance mode: hands-free scrolling through a set list.

mod clock;
mod input;
mod navigator;
mod scroll;
mod session;

pub use clock::{PlaybackClock, ScrollSpeed, Tick, DEFAULT_TICK_INTERVAL};
pub use input::{InputRouter, LiveAction};
pub use navigator::{Direction, TrackNavigator};
pub use scroll::{ContentMetrics, ScrollPosition};
pub use session::{LiveSession, LiveSettings, SessionController};
