//! Consolidation pass over a raw outcome list.
//!
//! After a merge the timeline may hold runs of consecutive intervals with the
//! same status. This pass absorbs each run into its first survivor so the
//! published timeline never shows two adjacent intervals with identical
//! status. Automatic driving intervals never take part: they neither absorb a
//! neighbor nor disappear into one.

use crate::event::DutyEvent;
use crate::outcome::{self, Outcome, OutcomeKind};

/// True if two intervals may collapse into one: same status, and neither is
/// an automatic driving record.
#[must_use]
pub fn can_combine(a: &DutyEvent, b: &DutyEvent) -> bool {
    a.status == b.status && !a.is_auto_driving() && !b.is_auto_driving()
}

/// The event as the applier will see it: the outcome's copy when one exists,
/// otherwise the stored record.
fn current_view(event: &DutyEvent, outcomes: &[Outcome]) -> DutyEvent {
    outcome::outcome_for(outcomes, &event.id)
        .map_or_else(|| event.clone(), |entry| entry.event.clone())
}

/// Collapses runs of combinable intervals in `timeline`, rewriting
/// `outcomes` in place.
///
/// Events already marked `Removed` are invisible to the scan. For each
/// absorbed interval, a pending `New` insert is cancelled outright; any other
/// outcome is reclassified to `Removed` (adding an entry for untouched
/// events). The scan resumes at the event that ended the run.
pub fn consolidate(outcomes: &mut Vec<Outcome>, timeline: &[DutyEvent]) {
    let mut i = 0;
    while i < timeline.len() {
        if outcome::kind_for(outcomes, &timeline[i].id) == OutcomeKind::Removed {
            i += 1;
            continue;
        }
        let anchor = current_view(&timeline[i], outcomes);

        let mut j = i + 1;
        while j < timeline.len() {
            if outcome::kind_for(outcomes, &timeline[j].id) == OutcomeKind::Removed {
                j += 1;
                continue;
            }
            let next = current_view(&timeline[j], outcomes);
            if !can_combine(&anchor, &next) {
                break;
            }
            if outcome::kind_for(outcomes, &next.id) == OutcomeKind::New {
                // A transient insert superseded before it was ever applied.
                outcome::cancel(outcomes, &next.id);
            } else {
                outcome::reclassify(outcomes, &next, OutcomeKind::Removed);
            }
            j += 1;
        }
        i = j;
    }
}
