//! Coverage analysis: how a merge candidate relates to the timeline.
//!
//! Walks consecutive timeline events as interval boundaries and decides
//! whether inserting the candidate requires restructuring the timeline, can
//! be absorbed by editing a single covering interval in place, or must be
//! refused because it would cut into a closed automatic driving interval.

use chrono::{DateTime, Utc};

use crate::event::DutyEvent;

/// The analyzer's verdict for a candidate span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePlan {
    /// The candidate changes status inside the timeline; run the full merge.
    Full,
    /// One interval (by timeline index) covers the whole span; copy the
    /// candidate's fields onto it and leave the structure alone.
    EditCovered(usize),
    /// The span cuts across a closed automatic driving interval; nothing may
    /// change.
    Blocked,
}

/// True for intervals that may never be split or altered: automatic driving
/// records whose closure fields are already computed.
#[must_use]
pub fn is_immutable(event: &DutyEvent) -> bool {
    event.is_auto_driving() && event.is_closed()
}

/// Classifies the candidate span `[candidate.datetime, right_boundary)`
/// against the timeline.
///
/// The timeline must be sorted ascending by `datetime`. Every interval whose
/// boundary falls inside the span is checked for immutability, not just the
/// first one encountered.
#[must_use]
pub fn plan_merge(
    timeline: &[DutyEvent],
    candidate: &DutyEvent,
    right_boundary: DateTime<Utc>,
) -> MergePlan {
    for (i, current) in timeline.iter().enumerate() {
        let next = timeline.get(i + 1);

        let covered = next.map_or(current.datetime <= candidate.datetime, |next| {
            current.datetime <= candidate.datetime && right_boundary <= next.datetime
        });

        if covered {
            if is_immutable(current) {
                // No restructuring allowed; the caller may still copy the
                // candidate's fields onto the covering interval.
                return MergePlan::EditCovered(i);
            }
            if current.status != candidate.status {
                return MergePlan::Full;
            }
            return MergePlan::EditCovered(i);
        }

        // The span straddles this interval's boundary. Any such interval
        // must be mutable or the merge cannot proceed at all.
        match next {
            None => {
                if current.datetime > candidate.datetime && is_immutable(current) {
                    return MergePlan::Blocked;
                }
            }
            Some(next) => {
                let covered_part = current.datetime < candidate.datetime
                    && next.datetime > candidate.datetime
                    && right_boundary > next.datetime;
                let covers_boundary =
                    current.datetime >= candidate.datetime && right_boundary >= next.datetime;
                if (covered_part || covers_boundary) && is_immutable(current) {
                    return MergePlan::Blocked;
                }
            }
        }
    }

    MergePlan::Full
}
