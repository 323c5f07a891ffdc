//! Per-tab foreground time accumulator.

use chrono::{DateTime, Utc};

/// Accumulates foreground time for one open visit.
///
/// At most one segment is open at a time. `pause` on a paused timer and
/// `resume` on a running timer are no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabTimer {
    accumulated_ms: u64,
    segment_start: Option<DateTime<Utc>>,
}

impl TabTimer {
    /// Creates a paused timer with nothing accumulated.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            accumulated_ms: 0,
            segment_start: None,
        }
    }

    /// Creates a timer that is already running from `now`.
    #[must_use]
    pub const fn started(now: DateTime<Utc>) -> Self {
        Self {
            accumulated_ms: 0,
            segment_start: Some(now),
        }
    }

    /// Begins accounting at `now`. No-op if already running.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.resume(now);
    }

    /// Folds the open segment into the total. No-op if paused.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if let Some(start) = self.segment_start.take() {
            self.accumulated_ms = self.accumulated_ms.saturating_add(delta_ms(start, now));
        }
    }

    /// Opens a new segment at `now`. No-op if running.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.segment_start.is_none() {
            self.segment_start = Some(now);
        }
    }

    /// Pauses and returns the total accumulated milliseconds.
    pub fn finalize(&mut self, now: DateTime<Utc>) -> u64 {
        self.pause(now);
        self.accumulated_ms
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.segment_start.is_some()
    }

    /// Time folded in so far, excluding any open segment.
    #[must_use]
    pub const fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }

    /// Time counted so far including the open segment, without mutating.
    #[must_use]
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        let open = self.segment_start.map_or(0, |start| delta_ms(start, now));
        self.accumulated_ms.saturating_add(open)
    }
}

/// Wall-clock delta in milliseconds, clamped to zero if the clock went back.
fn delta_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    let ms = (end - start).num_milliseconds();
    u64::try_from(ms).unwrap_or(0)
}
