//! Reject command: decline a device-recorded driving interval.

use anyhow::{Context, Result};

use eld_core::{DriverId, EventId};

use crate::driver::DriverIdentity;
use crate::{Config, lock, outbox};

use super::util::open_database;

pub fn run(config: &Config, identity: &DriverIdentity, event_id: &str) -> Result<()> {
    let driver =
        DriverId::new(identity.driver_id.as_str()).context("driver identity is invalid")?;
    let id = EventId::new(event_id).context("invalid event ID")?;

    lock::with_driver_lock(driver.as_str(), || {
        let mut db = open_database(config)?;
        let event = db
            .get_event(&id)?
            .with_context(|| format!("no event with ID {id}"))?;
        let timeline = db.duty_timeline(&driver)?;

        let outcomes = eld_core::reject_driving(&timeline, &event)?;

        db.apply_outcomes(&outcomes)?;
        let queued = outbox::queue_outcomes(&config.outbox_path, &outcomes)?;

        println!(
            "Rejected driving interval {id}: {} outcome(s), {queued} queued for push",
            outcomes.len()
        );
        Ok(())
    })
}
