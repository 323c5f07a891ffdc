//! Event stream intake shared by `track` and `replay`.

use std::io::BufRead;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dwell_core::{IdentitySource, SessionController, TimedEvent, VisitSink};

/// What happened while consuming an event stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Events handed to the controller.
    pub events: usize,
    /// Lines that could not be parsed and were skipped.
    pub malformed: usize,
    /// Latest event time seen.
    pub last_seen: Option<DateTime<Utc>>,
}

/// Feeds JSONL events from `reader` into `controller` until end of input.
///
/// Events without a timestamp are stamped with the current time. Malformed
/// lines are logged and skipped; only read errors end the feed early.
pub fn run<R, S, I>(reader: R, controller: &mut SessionController<S, I>) -> Result<FeedSummary>
where
    R: BufRead,
    S: VisitSink,
    I: IdentitySource,
{
    let mut summary = FeedSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read event stream")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let timed: TimedEvent = match serde_json::from_str(trimmed) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(line = index + 1, %err, "skipping malformed event");
                summary.malformed += 1;
                continue;
            }
        };

        let now = timed.timestamp.unwrap_or_else(Utc::now);
        summary.last_seen = Some(summary.last_seen.map_or(now, |seen| seen.max(now)));
        controller.handle(timed.event, now);
        summary.events += 1;
    }

    Ok(summary)
}
