//! Status command: database, identity and outbox state at a glance.

use std::io::Write;

use anyhow::{Context, Result};

use eld_core::DriverId;

use crate::driver::DriverIdentity;
use crate::{Config, outbox};

use super::util::open_database;

pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    identity: Option<&DriverIdentity>,
) -> Result<()> {
    writeln!(writer, "Duty logbook status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;

    let Some(identity) = identity else {
        writeln!(writer, "No driver identity. Run 'eld init --driver <id>'.")?;
        return Ok(());
    };
    writeln!(
        writer,
        "Driver: {} ({})",
        identity.label, identity.driver_id
    )?;

    let db = open_database(config)?;
    let driver =
        DriverId::new(identity.driver_id.as_str()).context("driver identity is invalid")?;
    let timeline = db.duty_timeline(&driver)?;

    match timeline.last() {
        Some(current) => {
            writeln!(writer, "Events: {}", timeline.len())?;
            writeln!(
                writer,
                "Current status: {} (since {})",
                current.status,
                current.datetime.format("%Y-%m-%d %H:%M")
            )?;
        }
        None => writeln!(writer, "No duty events recorded.")?,
    }

    let pending = outbox::pending_count(&config.outbox_path)?;
    writeln!(writer, "Pending push records: {pending}")?;

    Ok(())
}
