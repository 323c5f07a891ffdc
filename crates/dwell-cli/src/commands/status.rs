//! Status command for showing effective configuration and identity.

use std::io::Write;

use anyhow::Result;

use crate::{Config, identity};

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    writeln!(writer, "Dwell status")?;
    writeln!(writer, "Collector: {}", config.collector_url)?;
    writeln!(
        writer,
        "Idle detection interval: {}s",
        config.idle_detection_interval_secs
    )?;
    writeln!(writer, "Minimum visit: {}ms", config.min_visit_ms)?;

    match identity::load_from(&config.identity_path)? {
        Some(identity) => writeln!(writer, "User ID: {}", identity.user_id)?,
        None => writeln!(writer, "User ID: not provisioned (run 'dwell init')")?,
    }

    Ok(())
}
