//! Resolving free-text annotations onto merge results.
//!
//! A comment entered alongside a duty change must land on the interval the
//! driver was talking about: the surviving result that starts exactly at the
//! requested time, or failing that the nearest one starting before it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::DutyEvent;
use crate::outcome::{Outcome, OutcomeKind};
use crate::types::{AnnotationId, DriverId, EventId};

/// Shortest comment worth storing, after trimming.
pub const MIN_COMMENT_LEN: usize = 4;

/// A free-text note attached to one duty event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverId>,
    /// The timestamp the note was entered against.
    pub recorded_at: DateTime<Utc>,
    /// The duty event the note is bound to.
    pub event_id: EventId,
    pub comment: String,
}

/// Read access to stored annotations, provided by the environment.
pub trait AnnotationStore {
    type Error;

    /// The stored annotation for a duty event, if any.
    fn annotation_for(&self, event: &EventId) -> Result<Option<Annotation>, Self::Error>;
}

/// Picks the merge result a comment at `target` belongs to.
///
/// Only surviving results (`New` or `Edited`) qualify. An exact start-time
/// match wins immediately in outcome order; otherwise the qualifying result
/// with the greatest start at or before `target` is chosen.
#[must_use]
pub fn find_event_to_annotate(outcomes: &[Outcome], target: DateTime<Utc>) -> Option<&DutyEvent> {
    let mut best: Option<&DutyEvent> = None;
    for outcome in outcomes {
        if !matches!(outcome.kind, OutcomeKind::Edited | OutcomeKind::New) {
            continue;
        }
        let event = &outcome.event;
        match best {
            None => {
                if event.datetime <= target {
                    best = Some(event);
                }
            }
            Some(current) => {
                if event.datetime == target {
                    return Some(event);
                }
                if event.datetime > current.datetime && event.datetime < target {
                    best = Some(event);
                }
            }
        }
    }
    best
}

/// Binds `comment` to the merge result nearest `recorded_at`.
///
/// Returns the updated annotation when one already exists for the resolved
/// event, a fresh one otherwise, or `None` when no result qualifies or the
/// trimmed comment is too short to keep.
pub fn merge_annotation<S: AnnotationStore>(
    store: &S,
    outcomes: &[Outcome],
    recorded_at: DateTime<Utc>,
    comment: &str,
) -> Result<Option<Annotation>, S::Error> {
    let comment = comment.trim();
    if comment.len() < MIN_COMMENT_LEN {
        return Ok(None);
    }

    let Some(event) = find_event_to_annotate(outcomes, recorded_at) else {
        return Ok(None);
    };

    if let Some(mut existing) = store.annotation_for(&event.id)? {
        existing.comment = comment.to_string();
        return Ok(Some(existing));
    }

    Ok(Some(Annotation {
        id: AnnotationId::generate(),
        driver: event.driver.clone(),
        recorded_at,
        event_id: event.id.clone(),
        comment: comment.to_string(),
    }))
}
