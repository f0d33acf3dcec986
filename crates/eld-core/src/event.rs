//! Duty-status timeline events.
//!
//! A timeline is a sequence of [`DutyEvent`]s sorted strictly ascending by
//! `datetime`. Each event runs until the next one begins; the last event is
//! open-ended.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{DutyKind, DutyStatus};
use crate::types::{DriverId, EventId, ValidationError};

/// Provenance of a duty event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Entered by the driver.
    Driver,
    /// Recorded automatically by the device (e.g. detected driving).
    Auto,
    /// Not assumed by any driver (rejected or reassigned).
    Unidentified,
}

impl Origin {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Auto => "auto",
            Self::Unidentified => "unidentified",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" => Ok(Self::Driver),
            "auto" => Ok(Self::Auto),
            "unidentified" => Ok(Self::Unidentified),
            _ => Err(ValidationError::InvalidOrigin {
                value: s.to_string(),
            }),
        }
    }
}

/// One duty-status record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyEvent {
    /// Unique identifier for this event.
    pub id: EventId,

    /// The driver who owns this record. Cleared when the record is rejected
    /// back to the unidentified pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverId>,

    /// When the interval starts (inclusive). It ends where the next timeline
    /// event begins.
    pub datetime: DateTime<Utc>,

    /// How the record was produced.
    pub origin: Origin,

    /// The duty status in effect over the interval.
    pub status: DutyStatus,

    /// Human-readable location description at the start of the interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Odometer reading (miles) at the start of the interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odometer: Option<f64>,

    /// Engine hour-meter reading at the start of the interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_hours: Option<f64>,

    /// Miles covered over the interval, set when a driving interval closes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miles_accumulated: Option<f64>,

    /// Engine hours spent over the interval, set when a driving interval
    /// closes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_accumulated: Option<f64>,

    /// Interval length in minutes, set when a driving interval closes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
}

impl DutyEvent {
    /// Creates an open event with no readings attached.
    #[must_use]
    pub const fn new(
        id: EventId,
        driver: Option<DriverId>,
        datetime: DateTime<Utc>,
        origin: Origin,
        status: DutyStatus,
    ) -> Self {
        Self {
            id,
            driver,
            datetime,
            origin,
            status,
            location: None,
            odometer: None,
            engine_hours: None,
            miles_accumulated: None,
            hours_accumulated: None,
            duration_minutes: None,
        }
    }

    /// The regulatory event kind, derived from the status.
    #[must_use]
    pub const fn kind(&self) -> DutyKind {
        self.status.kind()
    }

    /// The regulatory event code, derived from the status.
    #[must_use]
    pub const fn code(&self) -> u8 {
        self.status.code()
    }

    /// True for device-recorded driving intervals.
    #[must_use]
    pub fn is_auto_driving(&self) -> bool {
        self.origin == Origin::Auto && self.status == DutyStatus::Driving
    }

    /// True once closure fields have been computed. A closed automatic
    /// driving interval can never be split or altered again.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.duration_minutes.is_some()
    }

    /// True if the event only exists for local display.
    #[must_use]
    pub fn is_local_stub(&self) -> bool {
        self.id.is_local_stub()
    }

    /// Structural validity for a merge candidate: the record must be owned
    /// by a driver. Identifier validity is guaranteed by construction.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.driver.is_some()
    }

    /// Copies the fields a merge candidate is allowed to impose onto an
    /// existing record: status, location and the start-of-interval readings.
    /// Identity (`id`, `datetime`) and closure fields are untouched.
    pub fn copy_significant_fields(&mut self, from: &Self) {
        self.status = from.status;
        self.location.clone_from(&from.location);
        self.odometer = from.odometer;
        self.engine_hours = from.engine_hours;
    }

    /// Clones this event as a new record starting at `datetime`.
    #[must_use]
    pub fn clone_at(&self, id: EventId, datetime: DateTime<Utc>) -> Self {
        let mut copy = self.clone();
        copy.id = id;
        copy.datetime = datetime;
        copy
    }
}
