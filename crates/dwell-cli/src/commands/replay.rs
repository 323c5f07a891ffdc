//! Replay command: run recorded browser events through the state machine and
//! print finished visits as JSONL instead of sending them.

use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use chrono::Utc;
use dwell_core::{SessionController, UserId, VisitRecord, VisitSink};

use crate::Config;
use crate::feed::{self, FeedSummary};

/// Writes each record as one JSON line.
#[derive(Debug)]
pub struct JsonlSink<W> {
    writer: W,
    written: usize,
    failed: usize,
}

impl<W: Write> JsonlSink<W> {
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            failed: 0,
        }
    }

    fn write_record(&mut self, record: &VisitRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> VisitSink for JsonlSink<W> {
    fn deliver(&mut self, record: VisitRecord) {
        match self.write_record(&record) {
            Ok(()) => self.written += 1,
            Err(err) => {
                tracing::warn!(%err, url = %record.url, "failed to write visit");
                self.failed += 1;
            }
        }
    }
}

/// Runs the replay command.
///
/// Open visits are closed at the latest event time once input ends.
pub fn run<R: BufRead, W: Write>(
    reader: R,
    writer: W,
    config: &Config,
    user_id: Option<UserId>,
) -> Result<FeedSummary> {
    let sink = JsonlSink::new(writer);
    let mut controller = SessionController::new(sink, user_id, config.tracker_config());

    let summary = feed::run(reader, &mut controller)?;
    controller.shutdown(summary.last_seen.unwrap_or_else(Utc::now));

    let stats = controller.stats();
    tracing::info!(
        events = summary.events,
        malformed = summary.malformed,
        delivered = stats.delivered,
        too_short = stats.too_short,
        no_identity = stats.no_identity,
        "replay finished"
    );

    let sink = controller.into_sink();
    if sink.failed > 0 {
        bail!("failed to write {} of {} visits", sink.failed, sink.failed + sink.written);
    }
    Ok(summary)
}
