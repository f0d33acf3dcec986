//! Export command: drain queued push records to stdout.
//!
//! Transport is external: pipe the output into whatever carries it to the
//! server (e.g. `eld export | ssh gateway eld-ingest`). Records are removed
//! from the outbox once written.

use std::io::Write;

use anyhow::Result;

use crate::{Config, outbox};

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let lines = outbox::drain(&config.outbox_path)?;
    for line in &lines {
        writeln!(writer, "{line}")?;
    }
    tracing::debug!(records = lines.len(), "drained outbox");
    Ok(())
}
