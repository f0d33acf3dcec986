//! Edit instructions produced by the merge engine.
//!
//! The engine never mutates the timeline it reads. It emits an ordered list
//! of [`Outcome`]s for an external applier to persist. Entries are keyed by
//! event identity: consolidation cancels or reclassifies an entry by
//! replacing it in place rather than juggling references.

use serde::{Deserialize, Serialize};

use crate::event::DutyEvent;
use crate::types::EventId;

/// What the applier must do with the attached event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Nothing to do; the default classification for untouched events.
    NoChange,
    /// An existing event with updated fields.
    Edited,
    /// An existing event to delete.
    Removed,
    /// A freshly created event to insert.
    New,
    /// An automatic driving interval whose closure fields were just computed.
    CloseDrive,
    /// An event demoted to the unidentified pool.
    Rejected,
}

/// One edit instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub event: DutyEvent,
}

impl Outcome {
    #[must_use]
    pub const fn new(kind: OutcomeKind, event: DutyEvent) -> Self {
        Self { kind, event }
    }
}

/// Looks up the outcome recorded for an event, by identity.
#[must_use]
pub fn outcome_for<'a>(outcomes: &'a [Outcome], id: &EventId) -> Option<&'a Outcome> {
    outcomes.iter().find(|outcome| outcome.event.id == *id)
}

/// The recorded kind for an event, or [`OutcomeKind::NoChange`] if the event
/// was not touched.
#[must_use]
pub fn kind_for(outcomes: &[Outcome], id: &EventId) -> OutcomeKind {
    outcome_for(outcomes, id).map_or(OutcomeKind::NoChange, |outcome| outcome.kind)
}

/// Reclassifies the entry for `event` to `kind`, adding an entry if the
/// event had none.
pub fn reclassify(outcomes: &mut Vec<Outcome>, event: &DutyEvent, kind: OutcomeKind) {
    if let Some(entry) = outcomes
        .iter_mut()
        .find(|outcome| outcome.event.id == event.id)
    {
        entry.kind = kind;
    } else {
        outcomes.push(Outcome::new(kind, event.clone()));
    }
}

/// Drops the entry for `id` entirely. Used when an insert is superseded
/// before it was ever applied.
pub fn cancel(outcomes: &mut Vec<Outcome>, id: &EventId) {
    outcomes.retain(|outcome| outcome.event.id != *id);
}
