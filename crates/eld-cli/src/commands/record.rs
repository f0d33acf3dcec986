//! Shared orchestration for timeline-changing commands.
//!
//! The merge engine is a pure computation; this module gives it the atomic
//! scope it needs: take the driver's lock, read the timeline, compute,
//! persist, queue for push. Nothing is written when the computation fails,
//! and a failure while applying rolls the whole batch back.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};

use eld_core::{DriverId, DutyEvent, Outcome, OutcomeKind};

use crate::driver::DriverIdentity;
use crate::{Config, lock, outbox};

use super::util::open_database;

/// A requested timeline change.
pub struct ChangeRequest {
    /// The candidate interval; its `datetime` is the span's left boundary.
    pub candidate: DutyEvent,
    /// Exclusive end of the candidate's effect.
    pub right_boundary: DateTime<Utc>,
    /// How far continuity bookkeeping extends past the span.
    pub horizon: DateTime<Utc>,
    /// Optional note to attach to the resulting interval.
    pub note: Option<String>,
    /// Seed the first interval directly when the timeline is empty
    /// (the merge engine requires an existing timeline).
    pub seed_if_empty: bool,
}

/// What a recorded change did.
pub struct ChangeReport {
    pub outcomes: Vec<Outcome>,
    pub annotated: bool,
    pub queued: usize,
}

/// Computes and applies a timeline change under the driver's lock.
pub fn record_change(
    config: &Config,
    identity: &DriverIdentity,
    request: &ChangeRequest,
) -> Result<ChangeReport> {
    let driver =
        DriverId::new(identity.driver_id.as_str()).context("driver identity is invalid")?;

    lock::with_driver_lock(driver.as_str(), || {
        let mut db = open_database(config)?;
        let timeline = db.duty_timeline(&driver)?;

        let outcomes = if timeline.is_empty() {
            if !request.seed_if_empty {
                bail!("timeline is empty; record a status with 'eld duty' first");
            }
            vec![Outcome::new(OutcomeKind::New, request.candidate.clone())]
        } else {
            let outcomes = eld_core::merge(
                &timeline,
                &request.candidate,
                request.right_boundary,
                request.horizon,
            )?;
            if outcomes.is_empty() {
                bail!(
                    "change refused: the span overlaps a closed automatic driving \
                     interval or lies outside the timeline"
                );
            }
            outcomes
        };

        let annotation = match &request.note {
            Some(note) => {
                eld_core::merge_annotation(&db, &outcomes, request.candidate.datetime, note)?
            }
            None => None,
        };

        db.apply_outcomes(&outcomes)?;
        if let Some(annotation) = &annotation {
            db.upsert_annotation(annotation)?;
        }

        let mut queued = outbox::queue_outcomes(&config.outbox_path, &outcomes)?;
        if let Some(annotation) = &annotation {
            if outbox::queue_annotation(&config.outbox_path, annotation)? {
                queued += 1;
            }
        }

        Ok(ChangeReport {
            outcomes,
            annotated: annotation.is_some(),
            queued,
        })
    })
}

/// One-line summary of an applied change, for command output.
pub fn summarize(report: &ChangeReport) -> String {
    let mut new = 0;
    let mut edited = 0;
    let mut removed = 0;
    let mut closed = 0;
    for outcome in &report.outcomes {
        match outcome.kind {
            OutcomeKind::New => new += 1,
            OutcomeKind::Edited => edited += 1,
            OutcomeKind::Removed => removed += 1,
            OutcomeKind::CloseDrive => closed += 1,
            OutcomeKind::Rejected | OutcomeKind::NoChange => {}
        }
    }
    let mut parts = Vec::new();
    if new > 0 {
        parts.push(format!("{new} new"));
    }
    if edited > 0 {
        parts.push(format!("{edited} edited"));
    }
    if removed > 0 {
        parts.push(format!("{removed} removed"));
    }
    if closed > 0 {
        parts.push(format!("{closed} driving closed"));
    }
    format!(
        "{} ({} queued for push)",
        if parts.is_empty() {
            "no changes".to_string()
        } else {
            parts.join(", ")
        },
        report.queued
    )
}
