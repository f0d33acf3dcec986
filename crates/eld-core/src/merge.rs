//! The timeline merge engine.
//!
//! Given the current timeline and a candidate interval spanning
//! `[candidate.datetime, right_boundary)`, computes the ordered list of edits
//! that inserts the candidate while keeping the timeline contiguous. The
//! engine is a pure computation: it reads the timeline, never mutates it,
//! and hands the resulting [`Outcome`] list to an external applier.
//!
//! The `horizon` timestamp marks how far continuity bookkeeping extends past
//! the edited span. When the span ends before the horizon, the status that
//! was in effect at the right boundary is reinstated there by a cloned
//! event, so the rest of the day keeps its recorded meaning.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::consolidate::consolidate;
use crate::coverage::{MergePlan, plan_merge};
use crate::event::DutyEvent;
use crate::outcome::{Outcome, OutcomeKind};
use crate::slot::is_minute_aligned;
use crate::types::EventId;

/// Why a merge request was refused before any computation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// The candidate is structurally invalid (e.g. owned by no driver).
    #[error("merge candidate is not valid")]
    InvalidCandidate,

    /// The candidate starts exactly at the right boundary, leaving nothing
    /// to insert.
    #[error("candidate span is empty at {0}")]
    EmptySpan(DateTime<Utc>),

    /// The right boundary does not sit on a whole minute.
    #[error("right boundary is not minute-aligned: {0}")]
    MisalignedRightBoundary(DateTime<Utc>),

    /// The horizon does not sit on a whole minute.
    #[error("horizon is not minute-aligned: {0}")]
    MisalignedHorizon(DateTime<Utc>),

    /// The horizon lies before the right boundary.
    #[error("horizon {horizon} lies before right boundary {right_boundary}")]
    HorizonBeforeRightBoundary {
        horizon: DateTime<Utc>,
        right_boundary: DateTime<Utc>,
    },

    /// There is no timeline to merge into.
    #[error("timeline is empty")]
    EmptyTimeline,
}

/// Merges `candidate` into `timeline` over `[candidate.datetime,
/// right_boundary)`.
///
/// The timeline must be sorted ascending by `datetime`. Returns the ordered
/// edit list, or an empty list when the change is disallowed because it
/// would cut into a closed automatic driving interval. Callers should
/// surface the empty case as a refused change, not as success.
pub fn merge(
    timeline: &[DutyEvent],
    candidate: &DutyEvent,
    right_boundary: DateTime<Utc>,
    horizon: DateTime<Utc>,
) -> Result<Vec<Outcome>, MergeError> {
    if !candidate.is_valid() {
        tracing::warn!(candidate = %candidate.id, "merge candidate is not valid");
        return Err(MergeError::InvalidCandidate);
    }
    if candidate.datetime == right_boundary {
        tracing::warn!(at = %right_boundary, "merge candidate span is empty");
        return Err(MergeError::EmptySpan(right_boundary));
    }
    if !is_minute_aligned(right_boundary) {
        tracing::warn!(at = %right_boundary, "right boundary is not minute-aligned");
        return Err(MergeError::MisalignedRightBoundary(right_boundary));
    }
    if !is_minute_aligned(horizon) {
        tracing::warn!(at = %horizon, "horizon is not minute-aligned");
        return Err(MergeError::MisalignedHorizon(horizon));
    }
    if horizon < right_boundary {
        tracing::warn!(%horizon, %right_boundary, "horizon lies before right boundary");
        return Err(MergeError::HorizonBeforeRightBoundary {
            horizon,
            right_boundary,
        });
    }
    if timeline.is_empty() {
        tracing::warn!("cannot merge into an empty timeline");
        return Err(MergeError::EmptyTimeline);
    }

    match plan_merge(timeline, candidate, right_boundary) {
        MergePlan::Full => Ok(merge_span(timeline, candidate, right_boundary, horizon)),
        MergePlan::EditCovered(i) => {
            let mut outcomes = Vec::new();
            edit_event(&mut outcomes, timeline[i].clone(), candidate);
            Ok(outcomes)
        }
        MergePlan::Blocked => {
            tracing::warn!(
                candidate = %candidate.id,
                "change refused: span cuts into a closed automatic driving interval"
            );
            Ok(Vec::new())
        }
    }
}

/// The full merge path: restructures the timeline around the candidate span.
fn merge_span(
    timeline: &[DutyEvent],
    candidate: &DutyEvent,
    right_boundary: DateTime<Utc>,
    horizon: DateTime<Utc>,
) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    let mut left_found = false;
    let mut right_found = false;

    for event in timeline {
        if event.datetime > candidate.datetime && event.datetime < right_boundary {
            // Now inside the candidate's span.
            outcomes.push(Outcome::new(OutcomeKind::Removed, event.clone()));
        } else if event.datetime == candidate.datetime {
            left_found = true;
            merge_pair(&mut outcomes, event, candidate);
        } else if event.datetime == right_boundary {
            right_found = true;
        }
    }

    if !left_found {
        if let Some(prev) = nearest_left(timeline, candidate.datetime) {
            if prev.status == candidate.status {
                edit_event(&mut outcomes, prev.clone(), candidate);
            } else {
                close_driving_if_open(&mut outcomes, prev, candidate);
                outcomes.push(Outcome::new(OutcomeKind::New, candidate.clone()));
            }
        }
    }

    if !right_found && right_boundary != horizon {
        // Reinstate the status that was in effect where the span ends.
        if let Some(source) = nearest_left(timeline, right_boundary) {
            let resumed = source.clone_at(EventId::generate(), right_boundary);
            if resumed.status != candidate.status {
                outcomes.push(Outcome::new(OutcomeKind::New, resumed));
            }
        }
    }

    consolidate(&mut outcomes, timeline);

    outcomes
}

/// Merges two events that share a start time.
///
/// Same derived kind: the existing record absorbs the candidate's fields.
/// Different kind: the existing record is replaced by a copy carrying the
/// candidate's identity and fields, since a record cannot change kind.
fn merge_pair(outcomes: &mut Vec<Outcome>, existing: &DutyEvent, candidate: &DutyEvent) {
    if existing.kind() == candidate.kind() {
        edit_event(outcomes, existing.clone(), candidate);
    } else {
        let mut replacement = existing.clone();
        replacement.id = candidate.id.clone();
        replacement.copy_significant_fields(candidate);
        outcomes.push(Outcome::new(OutcomeKind::Removed, existing.clone()));
        outcomes.push(Outcome::new(OutcomeKind::New, replacement));
    }
}

/// Copies the candidate's fields onto `existing` and records the edit.
fn edit_event(outcomes: &mut Vec<Outcome>, mut existing: DutyEvent, candidate: &DutyEvent) {
    existing.copy_significant_fields(candidate);
    outcomes.push(Outcome::new(OutcomeKind::Edited, existing));
}

/// Closes an open automatic driving interval against the event that ends it.
///
/// Duration and the accumulated odometer/engine-hour deltas are clamped to
/// zero so clock or sensor skew can never record negative driving.
fn close_driving_if_open(outcomes: &mut Vec<Outcome>, driving: &DutyEvent, closing: &DutyEvent) {
    if !driving.is_auto_driving() || driving.is_closed() {
        return;
    }

    let mut closed = driving.clone();

    let minutes = (closing.datetime - driving.datetime).num_minutes();
    closed.duration_minutes = Some(minutes.max(0));

    let hours = closing.engine_hours.unwrap_or(0.0) - driving.engine_hours.unwrap_or(0.0);
    closed.hours_accumulated = Some(hours.max(0.0));

    let miles = closing.odometer.unwrap_or(0.0) - driving.odometer.unwrap_or(0.0);
    closed.miles_accumulated = Some(miles.max(0.0));

    outcomes.push(Outcome::new(OutcomeKind::CloseDrive, closed));
}

/// The event with the greatest start strictly before `datetime`.
fn nearest_left(timeline: &[DutyEvent], datetime: DateTime<Utc>) -> Option<&DutyEvent> {
    timeline.iter().rev().find(|event| event.datetime < datetime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Origin;
    use crate::status::DutyStatus;
    use crate::types::DriverId;
    use chrono::TimeZone;

    fn ts(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0)
            .single()
            .expect("valid test timestamp")
            + chrono::Duration::minutes(minutes)
    }

    fn event(status: DutyStatus, origin: Origin, minutes: i64) -> DutyEvent {
        DutyEvent::new(
            EventId::generate(),
            Some(DriverId::new("driver-1").unwrap()),
            ts(minutes),
            origin,
            status,
        )
    }

    fn kinds(outcomes: &[Outcome]) -> Vec<OutcomeKind> {
        outcomes.iter().map(|o| o.kind).collect()
    }

    // ========== Validation ==========

    #[test]
    fn rejects_unowned_candidate() {
        let timeline = vec![event(DutyStatus::OffDuty, Origin::Driver, 0)];
        let mut candidate = event(DutyStatus::Driving, Origin::Driver, 10);
        candidate.driver = None;

        let result = merge(&timeline, &candidate, ts(20), ts(20));
        assert_eq!(result, Err(MergeError::InvalidCandidate));
    }

    #[test]
    fn rejects_empty_span() {
        let timeline = vec![event(DutyStatus::OffDuty, Origin::Driver, 0)];
        let candidate = event(DutyStatus::Driving, Origin::Driver, 10);

        let result = merge(&timeline, &candidate, ts(10), ts(20));
        assert_eq!(result, Err(MergeError::EmptySpan(ts(10))));
    }

    #[test]
    fn rejects_misaligned_boundaries() {
        let timeline = vec![event(DutyStatus::OffDuty, Origin::Driver, 0)];
        let candidate = event(DutyStatus::Driving, Origin::Driver, 10);
        let ragged = ts(20) + chrono::Duration::seconds(30);

        assert!(matches!(
            merge(&timeline, &candidate, ragged, ts(30)),
            Err(MergeError::MisalignedRightBoundary(_))
        ));
        assert!(matches!(
            merge(&timeline, &candidate, ts(20), ragged),
            Err(MergeError::MisalignedHorizon(_))
        ));
    }

    #[test]
    fn rejects_horizon_before_right_boundary() {
        let timeline = vec![event(DutyStatus::OffDuty, Origin::Driver, 0)];
        let candidate = event(DutyStatus::Driving, Origin::Driver, 10);

        assert!(matches!(
            merge(&timeline, &candidate, ts(20), ts(15)),
            Err(MergeError::HorizonBeforeRightBoundary { .. })
        ));
    }

    #[test]
    fn rejects_empty_timeline() {
        let candidate = event(DutyStatus::Driving, Origin::Driver, 10);
        assert_eq!(
            merge(&[], &candidate, ts(20), ts(20)),
            Err(MergeError::EmptyTimeline)
        );
    }

    // ========== Cheap edit fallback ==========

    #[test]
    fn covered_closed_driving_takes_field_edits_only() {
        let mut drive = event(DutyStatus::Driving, Origin::Auto, 0);
        drive.duration_minutes = Some(10);
        drive.location = Some("Yard A".to_string());
        drive.odometer = Some(123.0);
        let timeline = vec![drive.clone()];

        let mut candidate = event(DutyStatus::Driving, Origin::Driver, 1);
        candidate.location = Some("Yard B".to_string());
        candidate.odometer = Some(321.0);

        let outcomes = merge(&timeline, &candidate, ts(10), ts(10)).unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].kind, OutcomeKind::Edited);
        assert_eq!(outcomes[0].event.id, drive.id);
        assert_eq!(outcomes[0].event.location.as_deref(), Some("Yard B"));
        assert_eq!(outcomes[0].event.odometer, Some(321.0));
        // Identity and closure stay put.
        assert_eq!(outcomes[0].event.datetime, ts(0));
        assert_eq!(outcomes[0].event.duration_minutes, Some(10));
    }

    #[test]
    fn same_status_covered_interval_absorbs_fields() {
        let timeline = vec![event(DutyStatus::OffDuty, Origin::Driver, 0)];
        let mut candidate = event(DutyStatus::OffDuty, Origin::Driver, 10);
        candidate.location = Some("Rest area".to_string());

        let outcomes = merge(&timeline, &candidate, ts(20), ts(60)).unwrap();

        assert_eq!(kinds(&outcomes), vec![OutcomeKind::Edited]);
        assert_eq!(outcomes[0].event.id, timeline[0].id);
        assert_eq!(outcomes[0].event.location.as_deref(), Some("Rest area"));
    }

    // ========== Policy block ==========

    #[test]
    fn blocked_span_yields_no_outcomes() {
        let timeline = vec![
            event(DutyStatus::OffDuty, Origin::Driver, 0),
            {
                let mut e = event(DutyStatus::Driving, Origin::Auto, 5);
                e.duration_minutes = Some(10);
                e
            },
        ];
        let candidate = event(DutyStatus::OffDuty, Origin::Driver, 4);

        let outcomes = merge(&timeline, &candidate, ts(6), ts(6)).unwrap();
        assert!(outcomes.is_empty());
    }

    // ========== Full merge ==========

    #[test]
    fn splits_an_interval_around_the_candidate() {
        let timeline = vec![event(DutyStatus::OffDuty, Origin::Driver, 0)];
        let candidate = event(DutyStatus::Driving, Origin::Driver, 10);

        let outcomes = merge(&timeline, &candidate, ts(20), ts(30)).unwrap();

        assert_eq!(kinds(&outcomes), vec![OutcomeKind::New, OutcomeKind::New]);
        assert_eq!(outcomes[0].event.id, candidate.id);
        assert_eq!(outcomes[0].event.datetime, ts(10));
        // Continuity resumes as off-duty at the right boundary.
        assert_eq!(outcomes[1].event.status, DutyStatus::OffDuty);
        assert_eq!(outcomes[1].event.datetime, ts(20));
        assert_ne!(outcomes[1].event.id, timeline[0].id);
    }

    #[test]
    fn no_resume_event_when_span_reaches_the_horizon() {
        let timeline = vec![event(DutyStatus::OffDuty, Origin::Driver, 0)];
        let candidate = event(DutyStatus::Driving, Origin::Driver, 10);

        let outcomes = merge(&timeline, &candidate, ts(20), ts(20)).unwrap();

        assert_eq!(kinds(&outcomes), vec![OutcomeKind::New]);
        assert_eq!(outcomes[0].event.id, candidate.id);
    }

    #[test]
    fn no_resume_event_when_statuses_match_at_the_boundary() {
        let timeline = vec![
            event(DutyStatus::OffDuty, Origin::Driver, 0),
            event(DutyStatus::Driving, Origin::Driver, 30),
        ];
        let candidate = event(DutyStatus::Driving, Origin::Driver, 10);

        let outcomes = merge(&timeline, &candidate, ts(40), ts(60)).unwrap();

        // The swallowed interval is removed, the candidate inserted, and no
        // resume event appears because driving already continues past 40.
        assert_eq!(
            kinds(&outcomes),
            vec![OutcomeKind::Removed, OutcomeKind::New]
        );
        assert_eq!(outcomes[0].event.id, timeline[1].id);
        assert_eq!(outcomes[1].event.id, candidate.id);
    }

    #[test]
    fn resume_event_restores_the_interrupted_status() {
        let timeline = vec![
            event(DutyStatus::OffDuty, Origin::Driver, 0),
            event(DutyStatus::Driving, Origin::Driver, 30),
        ];
        let candidate = event(DutyStatus::OnDuty, Origin::Driver, 10);

        let outcomes = merge(&timeline, &candidate, ts(40), ts(60)).unwrap();

        assert_eq!(
            kinds(&outcomes),
            vec![OutcomeKind::Removed, OutcomeKind::New, OutcomeKind::New]
        );
        let resumed = &outcomes[2].event;
        assert_eq!(resumed.status, DutyStatus::Driving);
        assert_eq!(resumed.datetime, ts(40));
    }

    #[test]
    fn extending_a_matching_interval_edits_it_in_place() {
        let timeline = vec![
            event(DutyStatus::OffDuty, Origin::Driver, 0),
            event(DutyStatus::Driving, Origin::Driver, 30),
        ];
        let mut candidate = event(DutyStatus::OffDuty, Origin::Driver, 10);
        candidate.location = Some("Home terminal".to_string());

        let outcomes = merge(&timeline, &candidate, ts(35), ts(35)).unwrap();

        assert_eq!(
            kinds(&outcomes),
            vec![OutcomeKind::Removed, OutcomeKind::Edited]
        );
        assert_eq!(outcomes[0].event.id, timeline[1].id);
        assert_eq!(outcomes[1].event.id, timeline[0].id);
        assert_eq!(outcomes[1].event.location.as_deref(), Some("Home terminal"));
    }

    // ========== Pairwise merge at the left boundary ==========

    #[test]
    fn same_kind_pair_collapses_into_one_edit() {
        let timeline = vec![event(DutyStatus::Driving, Origin::Driver, 0)];
        let candidate = event(DutyStatus::Sleeping, Origin::Driver, 0);

        let outcomes = merge(&timeline, &candidate, ts(10), ts(10)).unwrap();

        assert_eq!(kinds(&outcomes), vec![OutcomeKind::Edited]);
        assert_eq!(outcomes[0].event.id, timeline[0].id);
        assert_eq!(outcomes[0].event.status, DutyStatus::Sleeping);
    }

    #[test]
    fn cross_kind_pair_replaces_the_record() {
        let timeline = vec![event(DutyStatus::OffDuty, Origin::Driver, 0)];
        let candidate = event(DutyStatus::YardMove, Origin::Driver, 0);

        let outcomes = merge(&timeline, &candidate, ts(10), ts(10)).unwrap();

        assert_eq!(
            kinds(&outcomes),
            vec![OutcomeKind::Removed, OutcomeKind::New]
        );
        assert_eq!(outcomes[0].event.id, timeline[0].id);
        assert_eq!(outcomes[1].event.id, candidate.id);
        assert_eq!(outcomes[1].event.status, DutyStatus::YardMove);
        // The replacement keeps the original's start.
        assert_eq!(outcomes[1].event.datetime, ts(0));
    }

    // ========== Driving closer ==========

    #[test]
    fn inserting_after_open_auto_driving_closes_it() {
        let mut drive = event(DutyStatus::Driving, Origin::Auto, 5);
        drive.engine_hours = Some(2.0);
        drive.odometer = Some(1.0);
        let timeline = vec![drive.clone()];

        let mut candidate = event(DutyStatus::OffDuty, Origin::Driver, 25);
        candidate.engine_hours = Some(7.0);
        candidate.odometer = Some(3.0);

        let outcomes = merge(&timeline, &candidate, ts(30), ts(30)).unwrap();

        assert_eq!(
            kinds(&outcomes),
            vec![OutcomeKind::CloseDrive, OutcomeKind::New]
        );
        let closed = &outcomes[0].event;
        assert_eq!(closed.id, drive.id);
        assert_eq!(closed.duration_minutes, Some(20));
        assert_eq!(closed.hours_accumulated, Some(5.0));
        assert_eq!(closed.miles_accumulated, Some(2.0));
    }

    #[test]
    fn closure_clamps_negative_readings_to_zero() {
        let mut drive = event(DutyStatus::Driving, Origin::Auto, 5);
        drive.engine_hours = Some(9.0);
        drive.odometer = Some(500.0);
        let timeline = vec![drive];

        // Sensor skew: the closing event reports smaller readings.
        let mut candidate = event(DutyStatus::OffDuty, Origin::Driver, 25);
        candidate.engine_hours = Some(7.0);
        candidate.odometer = Some(400.0);

        let outcomes = merge(&timeline, &candidate, ts(30), ts(30)).unwrap();

        let closed = &outcomes[0].event;
        assert_eq!(outcomes[0].kind, OutcomeKind::CloseDrive);
        assert_eq!(closed.hours_accumulated, Some(0.0));
        assert_eq!(closed.miles_accumulated, Some(0.0));
        assert_eq!(closed.duration_minutes, Some(20));
    }

    #[test]
    fn missing_readings_default_to_zero_on_close() {
        let drive = event(DutyStatus::Driving, Origin::Auto, 5);
        let timeline = vec![drive];

        let mut candidate = event(DutyStatus::OffDuty, Origin::Driver, 25);
        candidate.engine_hours = Some(7.0);
        candidate.odometer = Some(3.0);

        let outcomes = merge(&timeline, &candidate, ts(30), ts(30)).unwrap();

        let closed = &outcomes[0].event;
        assert_eq!(closed.hours_accumulated, Some(7.0));
        assert_eq!(closed.miles_accumulated, Some(3.0));
    }

    #[test]
    fn closed_auto_driving_is_never_restructured() {
        let mut drive = event(DutyStatus::Driving, Origin::Auto, 5);
        drive.duration_minutes = Some(5);
        let timeline = vec![
            event(DutyStatus::OffDuty, Origin::Driver, 0),
            drive.clone(),
            event(DutyStatus::OffDuty, Origin::Driver, 10),
        ];
        let candidate = event(DutyStatus::OnDuty, Origin::Driver, 11);

        let outcomes = merge(&timeline, &candidate, ts(15), ts(15)).unwrap();

        for outcome in &outcomes {
            assert_ne!(
                outcome.event.id, drive.id,
                "closed automatic driving interval must not be touched"
            );
        }
    }

    // ========== Consolidation wiring ==========

    #[test]
    fn merge_output_has_no_adjacent_duplicates() {
        let timeline = vec![
            event(DutyStatus::OffDuty, Origin::Driver, 0),
            event(DutyStatus::Driving, Origin::Driver, 30),
            event(DutyStatus::OffDuty, Origin::Driver, 60),
        ];
        // Rewriting the driving interval as off-duty makes all three match;
        // the later duplicate must be removed.
        let candidate = event(DutyStatus::OffDuty, Origin::Driver, 30);

        let outcomes = merge(&timeline, &candidate, ts(60), ts(90)).unwrap();

        // Both later intervals are absorbed into the leading off-duty one:
        // the rewritten interval and the trailing duplicate end up removed.
        let rewritten = outcomes
            .iter()
            .find(|o| o.event.id == timeline[1].id)
            .expect("driving interval must be rewritten");
        assert_eq!(rewritten.kind, OutcomeKind::Removed);
        let trailing = outcomes
            .iter()
            .find(|o| o.event.id == timeline[2].id)
            .expect("trailing duplicate must be consolidated");
        assert_eq!(trailing.kind, OutcomeKind::Removed);
        assert!(!outcomes.iter().any(|o| o.event.id == timeline[0].id));
    }
}
