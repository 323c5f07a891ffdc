//! Track command: host the state machine for a live browser.
//!
//! Browser events arrive on stdin as JSONL. Finished visits are POSTed to the
//! collector in the background; stdout carries only the startup handshake.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use chrono::Utc;
use dwell_core::{SessionController, UserId};
use dwell_http::HttpSink;
use serde_json::json;

use crate::Config;
use crate::feed;

/// Writes the startup handshake telling the browser side how often to sample
/// idle state.
pub fn write_handshake<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let line = json!({
        "type": "configure",
        "idle_detection_interval_secs": config.idle_detection_interval_secs,
    });
    writeln!(writer, "{line}").context("failed to write handshake")?;
    writer.flush().context("failed to flush handshake")?;
    Ok(())
}

/// Runs the track command until `reader` is exhausted.
///
/// Every visit still open at end of input is flushed before waiting for
/// in-flight deliveries.
pub fn run<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    config: &Config,
    user_id: Option<UserId>,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let sink = HttpSink::new(
        &config.collector_url,
        config.request_timeout(),
        runtime.handle().clone(),
    )
    .context("failed to create collector client")?;
    tracing::debug!(endpoint = %sink.endpoint(), "delivering visits");

    write_handshake(writer, config)?;

    let mut controller = SessionController::new(sink, user_id, config.tracker_config());
    let summary = feed::run(reader, &mut controller)?;
    controller.shutdown(Utc::now());

    let stats = controller.stats();
    tracing::info!(
        events = summary.events,
        malformed = summary.malformed,
        delivered = stats.delivered,
        too_short = stats.too_short,
        no_identity = stats.no_identity,
        "event stream closed"
    );

    let mut sink = controller.into_sink();
    runtime.block_on(sink.drain());
    Ok(())
}
