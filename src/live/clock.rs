//! Cooperative tick source for auto-scroll.
//!
//! The clock never runs on its own thread. The event loop asks it how long to
//! sleep ([`PlaybackClock::time_until_next_tick`]) and then polls it; each
//! poll yields at most one [`Tick`]. Speed is read when a tick fires, not when
//! the clock was started, so speed changes apply to the very next tick.

use std::time::{Duration, Instant};

/// Interval between ticks unless configured otherwise.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Auto-scroll speed as a percentage: 10 to 100 in steps of 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScrollSpeed(u8);

impl ScrollSpeed {
    pub const MIN: u8 = 10;
    pub const MAX: u8 = 100;
    pub const STEP: u8 = 10;

    /// Clamp into range and snap to the nearest step.
    pub fn new(percent: u32) -> Self {
        let clamped = percent.clamp(Self::MIN as u32, Self::MAX as u32);
        let step = Self::STEP as u32;
        let snapped = (clamped + step / 2) / step * step;
        Self(snapped.min(Self::MAX as u32) as u8)
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// Linear mapping: 50% scrolls 5 units per tick.
    pub fn units_per_tick(self) -> u32 {
        u32::from(self.0 / Self::STEP)
    }

    pub fn faster(self) -> Self {
        Self::new(u32::from(self.0) + u32::from(Self::STEP))
    }

    pub fn slower(self) -> Self {
        Self::new(u32::from(self.0).saturating_sub(u32::from(Self::STEP)))
    }
}

impl Default for ScrollSpeed {
    fn default() -> Self {
        Self(50)
    }
}

/// One firing of the clock: how far to advance, and which timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
    pub delta: u32,
}

#[derive(Debug, Clone, Copy)]
struct ActiveTimer {
    generation: u64,
    next_due: Instant,
}

/// Periodic timer with restart semantics: at most one timer is live, and
/// starting again replaces it.
#[derive(Debug)]
pub struct PlaybackClock {
    interval: Duration,
    speed: ScrollSpeed,
    timer: Option<ActiveTimer>,
    generation: u64,
}

impl PlaybackClock {
    pub fn new(interval: Duration, speed: ScrollSpeed) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            speed,
            timer: None,
            generation: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn speed(&self) -> ScrollSpeed {
        self.speed
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Generation of the live timer, if any. Every `start` creates a new one.
    pub fn generation(&self) -> Option<u64> {
        self.timer.map(|timer| timer.generation)
    }

    /// Start ticking at `speed`. A timer that is already running is cancelled
    /// first, so two tick streams can never overlap.
    pub fn start(&mut self, speed: ScrollSpeed, now: Instant) {
        self.stop();
        self.generation += 1;
        self.speed = speed;
        self.timer = Some(ActiveTimer {
            generation: self.generation,
            next_due: now + self.interval,
        });
    }

    /// Change the per-tick delta without touching the schedule.
    pub fn set_speed(&mut self, speed: ScrollSpeed) {
        self.speed = speed;
    }

    /// Cancel the pending tick. Returns whether a timer was running; calling
    /// it on a stopped clock does nothing.
    pub fn stop(&mut self) -> bool {
        self.timer.take().is_some()
    }

    /// Fire if the deadline has passed. Intervals missed because the caller
    /// polled late are skipped rather than replayed back to back.
    pub fn poll(&mut self, now: Instant) -> Option<Tick> {
        let timer = self.timer.as_mut()?;
        if now < timer.next_due {
            return None;
        }

        timer.next_due += self.interval;
        if timer.next_due <= now {
            timer.next_due = now + self.interval;
        }

        Some(Tick {
            generation: timer.generation,
            delta: self.speed.units_per_tick(),
        })
    }

    /// How long the caller may sleep before the next tick is due.
    pub fn time_until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.timer
            .map(|timer| timer.next_due.saturating_duration_since(now))
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL, ScrollSpeed::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn speed_snaps_to_steps_within_range() {
        assert_eq!(ScrollSpeed::new(0).percent(), 10);
        assert_eq!(ScrollSpeed::new(44).percent(), 40);
        assert_eq!(ScrollSpeed::new(45).percent(), 50);
        assert_eq!(ScrollSpeed::new(250).percent(), 100);
        assert_eq!(ScrollSpeed::new(100).faster().percent(), 100);
        assert_eq!(ScrollSpeed::new(10).slower().percent(), 10);
    }

    #[test]
    fn fifty_percent_requests_five_units_per_tick() {
        let start = Instant::now();
        let mut clock = PlaybackClock::new(100 * MS, ScrollSpeed::default());
        clock.start(ScrollSpeed::new(50), start);

        assert_eq!(clock.poll(start + 99 * MS), None);
        let tick = clock.poll(start + 100 * MS).unwrap();
        assert_eq!(tick.delta, 5);
    }

    #[test]
    fn set_speed_applies_on_next_tick_without_restart() {
        let start = Instant::now();
        let mut clock = PlaybackClock::default();
        clock.start(ScrollSpeed::new(50), start);
        let generation = clock.generation();

        clock.set_speed(ScrollSpeed::new(100));
        assert_eq!(clock.generation(), generation);
        assert_eq!(clock.time_until_next_tick(start), Some(100 * MS));
        assert_eq!(clock.poll(start + 100 * MS).unwrap().delta, 10);
    }

    #[test]
    fn restart_replaces_the_running_timer() {
        let start = Instant::now();
        let mut clock = PlaybackClock::default();
        clock.start(ScrollSpeed::default(), start);
        let first = clock.generation().unwrap();

        clock.start(ScrollSpeed::default(), start + 50 * MS);
        let second = clock.generation().unwrap();
        assert_ne!(first, second);

        // The replaced timer's deadline at 100ms no longer fires.
        assert_eq!(clock.poll(start + 100 * MS), None);
        let tick = clock.poll(start + 150 * MS).unwrap();
        assert_eq!(tick.generation, second);
    }

    #[test]
    fn stop_is_idempotent_and_silences_ticks() {
        let start = Instant::now();
        let mut clock = PlaybackClock::default();
        assert!(!clock.stop());

        clock.start(ScrollSpeed::default(), start);
        assert!(clock.stop());
        assert!(!clock.stop());
        assert_eq!(clock.poll(start + 10_000 * MS), None);
        assert_eq!(clock.time_until_next_tick(start), None);
    }

    #[test]
    fn late_poll_fires_once_and_skips_missed_intervals() {
        let start = Instant::now();
        let mut clock = PlaybackClock::default();
        clock.start(ScrollSpeed::default(), start);

        let late = start + 550 * MS;
        assert!(clock.poll(late).is_some());
        assert_eq!(clock.poll(late), None);
        assert_eq!(clock.time_until_next_tick(late), Some(100 * MS));
    }

    #[test]
    fn ticks_follow_the_interval() {
        let start = Instant::now();
        let mut clock = PlaybackClock::default();
        clock.start(ScrollSpeed::default(), start);

        let fired = (1..=10)
            .filter(|step| clock.poll(start + *step * 50 * MS).is_some())
            .count();
        assert_eq!(fired, 5);
    }
}
