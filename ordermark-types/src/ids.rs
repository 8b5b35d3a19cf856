//! Identifier types used throughout the ordermark workspace.
//!
//! Every handle into the host document is a UUID v7 newtype. The textual form
//! is what the report probe writes into scratch cells and parses back, so
//! `Display` and `FromStr` must stay inverse to each other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new identifier with the current timestamp.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Parses an identifier from its textual form.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }
    };
}

define_id!(
    /// Identifier of a model entity (an element instance) in the host document.
    EntityId
);

define_id!(
    /// Identifier of an element type. Type-level attributes live here and are
    /// shared by every instance of the type.
    ElementTypeId
);

define_id!(
    /// Identifier of a placed group instance.
    GroupId
);

define_id!(
    /// Identifier of a group type, the shared definition behind one or more
    /// group instances.
    GroupTypeId
);

define_id!(
    /// Identifier of a tabular report view.
    ReportId
);
