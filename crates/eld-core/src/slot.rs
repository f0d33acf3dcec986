//! Logbook slot arithmetic.
//!
//! Duty changes are recorded on a fixed grid of whole minutes. Boundary
//! timestamps handed to the merge engine must sit exactly on that grid.

use chrono::{DateTime, Duration, Timelike, Utc};

/// True when the timestamp carries no seconds or sub-second component.
#[must_use]
pub fn is_minute_aligned(t: DateTime<Utc>) -> bool {
    t.second() == 0 && t.nanosecond() == 0
}

/// The start of the logbook slot containing `now`, for a grid of
/// `slot_minutes`-long slots anchored at the epoch.
#[must_use]
pub fn slot_start(now: DateTime<Utc>, slot_minutes: u32) -> DateTime<Utc> {
    let slot_seconds = i64::from(slot_minutes.max(1)) * 60;
    let into_slot = now.timestamp().rem_euclid(slot_seconds);
    now - Duration::seconds(into_slot) - Duration::nanoseconds(i64::from(now.nanosecond()))
}

/// The `[start, end)` bounds of the logbook slot containing `now`.
#[must_use]
pub fn current_slot(now: DateTime<Utc>, slot_minutes: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = slot_start(now, slot_minutes);
    let end = start + Duration::minutes(i64::from(slot_minutes.max(1)));
    (start, end)
}
