//! Duty command: record a status change for the current logbook slot.

use anyhow::{Context, Result};
use chrono::Utc;

use eld_core::{DriverId, DutyEvent, DutyStatus, EventId, Origin, slot};

use crate::driver::DriverIdentity;
use crate::Config;

use super::record::{ChangeRequest, record_change, summarize};

/// Arguments carried over from the CLI.
pub struct DutyArgs {
    pub status: String,
    pub location: Option<String>,
    pub odometer: Option<f64>,
    pub engine_hours: Option<f64>,
    pub note: Option<String>,
}

pub fn run(config: &Config, identity: &DriverIdentity, args: DutyArgs) -> Result<()> {
    let status: DutyStatus = args.status.parse()?;
    let driver =
        DriverId::new(identity.driver_id.as_str()).context("driver identity is invalid")?;

    let (slot_start, slot_end) = slot::current_slot(Utc::now(), config.slot_minutes);

    let mut candidate = DutyEvent::new(
        EventId::generate(),
        Some(driver),
        slot_start,
        Origin::Driver,
        status,
    );
    candidate.location = args.location;
    candidate.odometer = args.odometer;
    candidate.engine_hours = args.engine_hours;

    let request = ChangeRequest {
        candidate,
        right_boundary: slot_end,
        horizon: slot_end,
        note: args.note,
        seed_if_empty: true,
    };
    let report = record_change(config, identity, &request)?;

    println!(
        "Recorded {status} at {}: {}",
        slot_start.format("%Y-%m-%d %H:%M"),
        summarize(&report)
    );
    Ok(())
}
