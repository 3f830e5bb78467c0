//! The live performance session.
//!
//! [`SessionController`] is the only thing that mutates navigation, scroll
//! and clock state. The UI feeds it keys, ticks and content metrics, then
//! reads back a [`LiveSession`] to draw.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers};
use tracing::{debug, info};

use super::clock::{PlaybackClock, ScrollSpeed, DEFAULT_TICK_INTERVAL};
use super::input::{InputRouter, LiveAction};
use super::navigator::{Direction, TrackNavigator};
use super::scroll::{ContentMetrics, ScrollPosition};
use crate::models::{Repertoire, Song};

/// Settings a session is started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveSettings {
    pub tick_interval: Duration,
    pub default_speed: ScrollSpeed,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            default_speed: ScrollSpeed::default(),
        }
    }
}

/// State of one performance. Read-only outside this module.
#[derive(Debug)]
pub struct LiveSession {
    repertoire: Repertoire,
    navigator: TrackNavigator,
    scroll: ScrollPosition,
    clock: PlaybackClock,
    needs_metrics: bool,
}

impl LiveSession {
    fn new(repertoire: Repertoire, songs: Vec<Song>, settings: LiveSettings) -> Self {
        Self {
            repertoire,
            navigator: TrackNavigator::new(songs),
            scroll: ScrollPosition::default(),
            clock: PlaybackClock::new(settings.tick_interval, settings.default_speed),
            needs_metrics: true,
        }
    }

    pub fn repertoire(&self) -> &Repertoire {
        &self.repertoire
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.navigator.current()
    }

    pub fn current_index(&self) -> usize {
        self.navigator.current_index()
    }

    pub fn song_count(&self) -> usize {
        self.navigator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.navigator.is_empty()
    }

    pub fn position(&self) -> Option<(usize, usize)> {
        self.navigator.position()
    }

    pub fn can_go_previous(&self) -> bool {
        !self.navigator.is_empty() && !self.navigator.is_first()
    }

    pub fn can_go_next(&self) -> bool {
        !self.navigator.is_empty() && !self.navigator.is_last()
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll.offset()
    }

    pub fn max_scroll(&self) -> u32 {
        self.scroll.max_scroll()
    }

    /// Derived from the clock, so it cannot disagree with whether a timer is
    /// live.
    pub fn is_auto_scrolling(&self) -> bool {
        self.clock.is_running()
    }

    pub fn speed(&self) -> ScrollSpeed {
        self.clock.speed()
    }

    pub fn timer_generation(&self) -> Option<u64> {
        self.clock.generation()
    }

    fn song_changed(&mut self) {
        self.scroll.reset();
        self.clock.stop();
        self.needs_metrics = true;
    }
}

/// Owns the live session, if one is running, and the key router bound to it.
#[derive(Debug, Default)]
pub struct SessionController {
    settings: LiveSettings,
    session: Option<LiveSession>,
    router: InputRouter,
}

impl SessionController {
    pub fn new(settings: LiveSettings) -> Self {
        Self {
            settings,
            session: None,
            router: InputRouter::new(),
        }
    }

    pub fn settings(&self) -> LiveSettings {
        self.settings
    }

    pub fn session(&self) -> Option<&LiveSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    /// Begin performing `songs`, already ordered. Any running session is
    /// exited first.
    pub fn start_session(&mut self, repertoire: Repertoire, songs: Vec<Song>) {
        self.exit_session();
        info!(
            repertoire_id = repertoire.id,
            songs = songs.len(),
            "live session started"
        );
        self.session = Some(LiveSession::new(repertoire, songs, self.settings));
        self.router.mount();
    }

    /// Stop the clock and unmount the router before dropping the session.
    /// Returns whether a session was running.
    pub fn exit_session(&mut self) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };
        session.clock.stop();
        self.router.unmount();
        info!(repertoire_id = session.repertoire.id, "live session ended");
        true
    }

    /// Start or stop auto-scroll. Returns the new running state. Sessions
    /// without songs never start a timer.
    pub fn toggle_auto_scroll(&mut self, now: Instant) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.navigator.is_empty() {
            return false;
        }
        if session.clock.stop() {
            debug!("auto-scroll stopped");
            return false;
        }
        let speed = session.clock.speed();
        session.clock.start(speed, now);
        debug!(speed = speed.percent(), "auto-scroll started");
        true
    }

    /// Move to the neighbouring song. A successful move resets the scroll
    /// and stops auto-scroll.
    pub fn go_to(&mut self, direction: Direction) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.navigator.step(direction) {
            return false;
        }
        session.song_changed();
        debug!(index = session.navigator.current_index(), "song changed");
        true
    }

    /// Takes effect on the next tick; a running clock keeps its schedule.
    pub fn set_speed(&mut self, percent: u32) -> Option<ScrollSpeed> {
        let session = self.session.as_mut()?;
        let speed = ScrollSpeed::new(percent);
        session.clock.set_speed(speed);
        Some(speed)
    }

    pub fn faster(&mut self) -> Option<ScrollSpeed> {
        let percent = self.session.as_ref()?.speed().faster().percent();
        self.set_speed(u32::from(percent))
    }

    pub fn slower(&mut self) -> Option<ScrollSpeed> {
        let percent = self.session.as_ref()?.speed().slower().percent();
        self.set_speed(u32::from(percent))
    }

    /// Back to the top, with auto-scroll stopped.
    pub fn reset_scroll(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.scroll.reset();
            session.clock.stop();
        }
    }

    /// Route a key through the mounted router and apply the result.
    pub fn handle_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        now: Instant,
    ) -> Option<LiveAction> {
        let action = self.router.route(code, modifiers)?;
        self.apply(action, now);
        Some(action)
    }

    pub fn apply(&mut self, action: LiveAction, now: Instant) {
        match action {
            LiveAction::Previous => {
                self.go_to(Direction::Previous);
            }
            LiveAction::Next => {
                self.go_to(Direction::Next);
            }
            LiveAction::ToggleAutoScroll => {
                self.toggle_auto_scroll(now);
            }
            LiveAction::ResetScroll => self.reset_scroll(),
        }
    }

    /// Drive the clock. A due tick advances the scroll using the bounds held
    /// right now; hitting the bound stops auto-scroll in the same call.
    /// Returns whether anything changed and the view should redraw.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(tick) = session.clock.poll(now) else {
            return false;
        };
        if session.scroll.advance(tick.delta) {
            session.clock.stop();
            debug!(generation = tick.generation, "auto-scroll reached the end");
        }
        true
    }

    pub fn time_until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.session
            .as_ref()
            .and_then(|session| session.clock.time_until_next_tick(now))
    }

    pub fn set_content_metrics(&mut self, metrics: ContentMetrics) {
        if let Some(session) = self.session.as_mut() {
            session.scroll.set_metrics(metrics);
            session.needs_metrics = false;
        }
    }

    /// True after a song change until the UI has measured the new content.
    pub fn needs_metrics(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.needs_metrics)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn repertoire() -> Repertoire {
        Repertoire {
            id: 1,
            name: "Friday gig".into(),
            description: None,
            owner_id: 1,
            created_at: Utc::now(),
        }
    }

    fn songs(count: usize) -> Vec<Song> {
        (0..count)
            .map(|i| Song {
                id: i as i64 + 1,
                repertoire_id: 1,
                title: format!("Song {}", i + 1),
                artist: None,
                key: None,
                chord_text: Some("C G Am F".into()),
                notes: None,
                position: i as i64,
            })
            .collect()
    }

    fn started(count: usize) -> SessionController {
        let mut controller = SessionController::new(LiveSettings::default());
        controller.start_session(repertoire(), songs(count));
        controller
    }

    fn view(controller: &SessionController) -> &LiveSession {
        controller.session().unwrap()
    }

    #[test]
    fn navigation_saturates_at_the_last_song() {
        let mut controller = started(3);
        let now = Instant::now();
        assert_eq!(view(&controller).current_index(), 0);

        controller.handle_key(KeyCode::Right, KeyModifiers::NONE, now);
        controller.handle_key(KeyCode::Right, KeyModifiers::NONE, now);
        assert_eq!(view(&controller).current_index(), 2);

        controller.handle_key(KeyCode::Right, KeyModifiers::NONE, now);
        assert_eq!(view(&controller).current_index(), 2);
        assert!(!view(&controller).can_go_next());
    }

    #[test]
    fn song_change_resets_scroll_and_stops_auto_scroll() {
        let mut controller = started(2);
        let start = Instant::now();
        controller.set_content_metrics(ContentMetrics::new(1_000, 100));
        controller.toggle_auto_scroll(start);
        controller.poll(start + 100 * MS);
        assert_eq!(view(&controller).scroll_offset(), 5);

        assert!(controller.go_to(Direction::Next));
        let session = view(&controller);
        assert_eq!(session.scroll_offset(), 0);
        assert!(!session.is_auto_scrolling());
        assert!(controller.needs_metrics());
    }

    #[test]
    fn blocked_navigation_keeps_scroll_and_playback() {
        let mut controller = started(1);
        let start = Instant::now();
        controller.set_content_metrics(ContentMetrics::new(1_000, 100));
        controller.toggle_auto_scroll(start);
        controller.poll(start + 100 * MS);

        assert!(!controller.go_to(Direction::Next));
        assert!(view(&controller).is_auto_scrolling());
        assert_eq!(view(&controller).scroll_offset(), 5);
        assert!(!controller.needs_metrics());
    }

    #[test]
    fn reaching_the_bound_stops_auto_scroll_on_the_same_tick() {
        let mut controller = started(1);
        let start = Instant::now();
        controller.set_content_metrics(ContentMetrics::new(200, 100));
        controller.toggle_auto_scroll(start);

        let mut now = start;
        for _ in 0..19 {
            now += 100 * MS;
            controller.poll(now);
        }
        assert_eq!(view(&controller).scroll_offset(), 95);

        controller.reset_scroll();

        // Creep up to 98 at one unit per tick, then overshoot at five.
        controller.set_speed(10);
        controller.toggle_auto_scroll(now);
        for _ in 0..98 {
            now += 100 * MS;
            controller.poll(now);
        }
        assert_eq!(view(&controller).scroll_offset(), 98);

        controller.set_speed(50);
        now += 100 * MS;
        assert!(controller.poll(now));
        assert_eq!(view(&controller).scroll_offset(), 100);
        assert!(!view(&controller).is_auto_scrolling());
        assert_eq!(controller.time_until_next_tick(now), None);
    }

    #[test]
    fn toggle_twice_restores_state() {
        let mut controller = started(2);
        let now = Instant::now();
        assert!(controller.toggle_auto_scroll(now));
        assert!(view(&controller).is_auto_scrolling());
        assert!(view(&controller).timer_generation().is_some());

        assert!(!controller.toggle_auto_scroll(now));
        assert!(!view(&controller).is_auto_scrolling());
        assert_eq!(view(&controller).timer_generation(), None);
    }

    #[test]
    fn empty_session_has_no_content_and_starts_no_timer() {
        let mut controller = started(0);
        let now = Instant::now();
        assert!(view(&controller).is_empty());
        assert!(view(&controller).current_song().is_none());

        assert!(!controller.go_to(Direction::Next));
        assert!(!controller.go_to(Direction::Previous));
        assert!(!controller.toggle_auto_scroll(now));
        controller.handle_key(KeyCode::Char(' '), KeyModifiers::NONE, now);
        assert!(!view(&controller).is_auto_scrolling());
        assert_eq!(controller.time_until_next_tick(now), None);
    }

    #[test]
    fn reset_key_rewinds_and_stops() {
        let mut controller = started(1);
        let start = Instant::now();
        controller.set_content_metrics(ContentMetrics::new(1_000, 100));
        controller.handle_key(KeyCode::Char(' '), KeyModifiers::NONE, start);
        controller.poll(start + 100 * MS);

        let action = controller.handle_key(KeyCode::Char('r'), KeyModifiers::NONE, start);
        assert_eq!(action, Some(LiveAction::ResetScroll));
        assert_eq!(view(&controller).scroll_offset(), 0);
        assert!(!view(&controller).is_auto_scrolling());
    }

    #[test]
    fn speed_change_applies_on_next_tick() {
        let mut controller = started(1);
        let start = Instant::now();
        controller.set_content_metrics(ContentMetrics::new(1_000, 100));
        controller.toggle_auto_scroll(start);
        let generation = view(&controller).timer_generation();

        assert_eq!(controller.faster().map(ScrollSpeed::percent), Some(60));
        assert_eq!(view(&controller).timer_generation(), generation);
        controller.poll(start + 100 * MS);
        assert_eq!(view(&controller).scroll_offset(), 6);
    }

    #[test]
    fn exit_stops_clock_and_unmounts_router() {
        let mut controller = started(3);
        let now = Instant::now();
        controller.toggle_auto_scroll(now);

        assert!(controller.exit_session());
        assert!(!controller.is_active());
        assert!(!controller.router().is_mounted());
        assert_eq!(
            controller.handle_key(KeyCode::Right, KeyModifiers::NONE, now),
            None
        );
        assert!(!controller.poll(now + 1_000 * MS));
        assert!(!controller.exit_session());
    }

    #[test]
    fn index_stays_in_bounds_for_any_key_sequence() {
        let mut controller = started(4);
        let now = Instant::now();
        let keys = [
            KeyCode::Left,
            KeyCode::Right,
            KeyCode::Right,
            KeyCode::Left,
            KeyCode::Left,
            KeyCode::Left,
            KeyCode::Right,
            KeyCode::Right,
            KeyCode::Right,
            KeyCode::Right,
            KeyCode::Right,
        ];
        for key in keys {
            controller.handle_key(key, KeyModifiers::NONE, now);
            let index = view(&controller).current_index();
            assert!(index < 4);
        }
        assert_eq!(view(&controller).current_index(), 3);
    }
}
