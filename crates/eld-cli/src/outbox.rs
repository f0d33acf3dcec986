//! Push outbox for the carrier server.
//!
//! Merge results are persisted locally first and queued here as JSONL
//! records; `eld export` drains the queue to stdout for an external
//! transport (e.g. an ssh pipeline). Events whose ID carries the local-stub
//! prefix exist only for display and are never queued, and closure outcomes
//! are persistence-only.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use eld_core::{Annotation, DutyEvent, EventId, Outcome, OutcomeKind};

/// One queued wire operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PushRecord {
    /// Insert-or-update of a full event record.
    Upsert { event: DutyEvent },
    /// Deletion by event ID.
    Remove { id: EventId },
    /// Insert-or-update of an annotation.
    Annotate { annotation: Annotation },
}

/// Maps merge outcomes to wire operations.
///
/// Local stubs are dropped entirely; `CloseDrive` and `NoChange` have no
/// wire representation.
#[must_use]
pub fn push_records(outcomes: &[Outcome]) -> Vec<PushRecord> {
    outcomes
        .iter()
        .filter(|outcome| !outcome.event.is_local_stub())
        .filter_map(|outcome| match outcome.kind {
            OutcomeKind::Removed => Some(PushRecord::Remove {
                id: outcome.event.id.clone(),
            }),
            OutcomeKind::New | OutcomeKind::Edited | OutcomeKind::Rejected => {
                Some(PushRecord::Upsert {
                    event: outcome.event.clone(),
                })
            }
            OutcomeKind::CloseDrive | OutcomeKind::NoChange => None,
        })
        .collect()
}

/// Queues the wire operations for a merge result. Returns how many records
/// were written.
pub fn queue_outcomes(path: &Path, outcomes: &[Outcome]) -> Result<usize> {
    append(path, &push_records(outcomes))
}

/// Queues an annotation, unless it is bound to a local stub. Returns whether
/// it was queued.
pub fn queue_annotation(path: &Path, annotation: &Annotation) -> Result<bool> {
    if annotation.event_id.is_local_stub() {
        return Ok(false);
    }
    append(
        path,
        &[PushRecord::Annotate {
            annotation: annotation.clone(),
        }],
    )?;
    Ok(true)
}

/// Takes every queued record out of the outbox.
pub fn drain(path: &Path) -> Result<Vec<String>> {
    let mut file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to open {}", path.display()));
        }
    };
    file.lock_exclusive()
        .with_context(|| format!("failed to lock {}", path.display()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .with_context(|| format!("failed to read {}", path.display()))?;
    file.set_len(0)
        .with_context(|| format!("failed to truncate {}", path.display()))?;

    let lines = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();

    if let Err(err) = fs2::FileExt::unlock(&file) {
        tracing::warn!(path = %path.display(), %err, "failed to unlock outbox");
    }
    Ok(lines)
}

/// How many records are waiting to be pushed.
pub fn pending_count(path: &Path) -> Result<usize> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(contents.lines().filter(|l| !l.trim().is_empty()).count()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

fn append(path: &Path, records: &[PushRecord]) -> Result<usize> {
    if records.is_empty() {
        return Ok(0);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("failed to lock {}", path.display()))?;

    for record in records {
        let json = serde_json::to_string(record).context("failed to encode push record")?;
        writeln!(file, "{json}").with_context(|| format!("failed to write {}", path.display()))?;
    }

    if let Err(err) = fs2::FileExt::unlock(&file) {
        tracing::warn!(path = %path.display(), %err, "failed to unlock outbox");
    }
    Ok(records.len())
}
