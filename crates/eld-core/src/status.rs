//! Duty statuses and their derived regulatory classification.
//!
//! The event kind and regulatory code are total functions of the status.
//! They are computed on demand and never stored, so a record can never carry
//! a kind or code that disagrees with its status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::ValidationError;

/// A driver's duty status for one timeline interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DutyStatus {
    OffDuty,
    Sleeping,
    Driving,
    OnDuty,
    YardMove,
}

/// Regulatory event kind derived from the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DutyKind {
    /// A change of duty status (off duty, sleeper berth, driving, on duty).
    DutyStatus,
    /// A change in special driving indication (yard moves).
    YardMovePersonalConveyance,
}

impl DutyStatus {
    /// The event kind this status records under.
    #[must_use]
    pub const fn kind(self) -> DutyKind {
        match self {
            Self::YardMove => DutyKind::YardMovePersonalConveyance,
            Self::OffDuty | Self::Sleeping | Self::Driving | Self::OnDuty => DutyKind::DutyStatus,
        }
    }

    /// The regulatory event code within the kind.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::OffDuty => 1,
            Self::Sleeping | Self::YardMove => 2,
            Self::Driving => 3,
            Self::OnDuty => 4,
        }
    }

    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OffDuty => "off_duty",
            Self::Sleeping => "sleeping",
            Self::Driving => "driving",
            Self::OnDuty => "on_duty",
            Self::YardMove => "yard_move",
        }
    }
}

impl fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DutyStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off_duty" | "off-duty" => Ok(Self::OffDuty),
            "sleeping" | "sleeper" => Ok(Self::Sleeping),
            "driving" => Ok(Self::Driving),
            "on_duty" | "on-duty" => Ok(Self::OnDuty),
            "yard_move" | "yard-move" => Ok(Self::YardMove),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for DutyStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DutyStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
