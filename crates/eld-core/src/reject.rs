//! Rejecting automatically recorded driving back to the unidentified pool.
//!
//! A driver may decline a device-recorded driving interval that was assigned
//! to them. The record is not deleted: it loses its owner, its origin becomes
//! unidentified, and consolidation then decides whether it survives on the
//! timeline or is absorbed by a matching neighbor.

use thiserror::Error;

use crate::consolidate::consolidate;
use crate::event::{DutyEvent, Origin};
use crate::outcome::{Outcome, OutcomeKind};
use crate::status::DutyStatus;

/// Why a rejection request was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RejectError {
    /// The event is structurally invalid.
    #[error("event is not valid")]
    InvalidEvent,

    /// Only driving intervals can be rejected.
    #[error("cannot reject a {0} interval")]
    NotDriving(DutyStatus),

    /// Only device-recorded intervals can be rejected.
    #[error("cannot reject a {0}-origin interval")]
    NotAutomatic(Origin),

    /// The driving interval has not been closed yet.
    #[error("driving interval is still open")]
    NotClosed,

    /// There is no timeline to consolidate against.
    #[error("timeline is empty")]
    EmptyTimeline,
}

/// Demotes a closed automatic driving interval to the unidentified pool.
///
/// Returns the `Rejected` outcome plus whatever consolidation adds. The
/// timeline must be sorted ascending by `datetime` and contain the event.
pub fn reject_driving(
    timeline: &[DutyEvent],
    event: &DutyEvent,
) -> Result<Vec<Outcome>, RejectError> {
    if timeline.is_empty() {
        tracing::warn!("cannot reject against an empty timeline");
        return Err(RejectError::EmptyTimeline);
    }
    if !event.is_valid() {
        tracing::warn!(event = %event.id, "reject target is not valid");
        return Err(RejectError::InvalidEvent);
    }
    if event.status != DutyStatus::Driving {
        tracing::warn!(event = %event.id, status = %event.status, "reject target is not driving");
        return Err(RejectError::NotDriving(event.status));
    }
    if event.origin != Origin::Auto {
        tracing::warn!(event = %event.id, origin = %event.origin, "reject target is not automatic");
        return Err(RejectError::NotAutomatic(event.origin));
    }
    if !event.is_closed() {
        tracing::warn!(event = %event.id, "reject target is still open");
        return Err(RejectError::NotClosed);
    }

    let mut rejected = event.clone();
    if rejected.miles_accumulated.is_none() {
        rejected.miles_accumulated = Some(0.0);
    }
    if rejected.hours_accumulated.is_none() {
        rejected.hours_accumulated = Some(0.0);
    }
    rejected.driver = None;
    rejected.origin = Origin::Unidentified;

    let mut outcomes = vec![Outcome::new(OutcomeKind::Rejected, rejected)];
    consolidate(&mut outcomes, timeline);

    Ok(outcomes)
}
