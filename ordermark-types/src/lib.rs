//! Core type definitions for ordermark.
//!
//! This crate defines the host-agnostic identifiers shared by every other
//! crate in the workspace:
//! - Entity, element type, group, group type and report identifiers (UUID v7)
//! - The crate-level error type for identifier parsing
//!
//! Attribute and entity shapes live in `ordermark-model`; the host document
//! surface lives in `ordermark-document`.

mod ids;

pub use ids::{ElementTypeId, EntityId, GroupId, GroupTypeId, ReportId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid identifier token: {0}")]
    InvalidToken(String),
}
