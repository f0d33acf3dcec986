//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid origin value.
    #[error("invalid origin: {value}")]
    InvalidOrigin { value: String },

    /// Invalid duty status value.
    #[error("invalid duty status: {value}")]
    InvalidStatus { value: String },
}

/// Prefix marking an event as a local display stub.
///
/// Stub events are persisted locally but never queued for push to the
/// carrier server.
pub const LOCAL_STUB_PREFIX: &str = "local-";

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Generates a fresh random ID.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated duty-event identifier.
    ///
    /// Event IDs must be non-empty strings. They should be unique within the
    /// system, though uniqueness is enforced at the database level.
    EventId, "event ID"
);

define_string_id!(
    /// A validated driver identifier.
    DriverId, "driver ID"
);

define_string_id!(
    /// A validated annotation identifier.
    AnnotationId, "annotation ID"
);

impl EventId {
    /// True if the event only exists for local display and must be kept off
    /// the wire.
    #[must_use]
    pub fn is_local_stub(&self) -> bool {
        self.0.starts_with(LOCAL_STUB_PREFIX)
    }
}
