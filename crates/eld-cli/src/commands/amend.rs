//! Amend command: rewrite a past span of the timeline.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime, Utc};

use eld_core::{DriverId, DutyEvent, DutyStatus, EventId, Origin, slot};

use crate::driver::DriverIdentity;
use crate::Config;

use super::record::{ChangeRequest, record_change, summarize};

/// Arguments carried over from the CLI.
pub struct AmendArgs {
    pub status: String,
    pub from: String,
    pub to: String,
    pub horizon: Option<String>,
    pub location: Option<String>,
    pub odometer: Option<f64>,
    pub engine_hours: Option<f64>,
    pub note: Option<String>,
}

pub fn run(config: &Config, identity: &DriverIdentity, args: AmendArgs) -> Result<()> {
    let status: DutyStatus = args.status.parse()?;
    let driver =
        DriverId::new(identity.driver_id.as_str()).context("driver identity is invalid")?;

    let from = parse_time(&args.from)?;
    let to = parse_time(&args.to)?;
    if to <= from {
        bail!("--to must be after --from");
    }
    let horizon = match &args.horizon {
        Some(raw) => parse_time(raw)?,
        // Bookkeeping runs to the current slot, but never short of the span.
        None => slot::slot_start(Utc::now(), config.slot_minutes).max(to),
    };

    let mut candidate = DutyEvent::new(
        EventId::generate(),
        Some(driver),
        from,
        Origin::Driver,
        status,
    );
    candidate.location = args.location;
    candidate.odometer = args.odometer;
    candidate.engine_hours = args.engine_hours;

    let request = ChangeRequest {
        candidate,
        right_boundary: to,
        horizon,
        note: args.note,
        seed_if_empty: false,
    };
    let report = record_change(config, identity, &request)?;

    println!(
        "Amended {} - {} to {status}: {}",
        from.format("%Y-%m-%d %H:%M"),
        to.format("%Y-%m-%d %H:%M"),
        summarize(&report)
    );
    Ok(())
}

/// Parses RFC 3339 or `YYYY-MM-DD HH:MM` (taken as UTC).
fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").with_context(|| {
        format!("unrecognized time '{raw}' (expected RFC 3339 or 'YYYY-MM-DD HH:MM')")
    })?;
    Ok(naive.and_utc())
}
