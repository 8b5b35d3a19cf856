//! Host document surface for ordermark.
//!
//! The engine never talks to a CAD host directly. It drives a [`Document`]:
//!
//! - Batches nest `Group ⊃ Transaction ⊃ SubTransaction`; a [`Batch`] guard
//!   rolls back whatever was not committed when it goes out of scope
//! - Attributes resolve per owner ([`AttributeOwner`]) at access time
//! - Groups can be dissolved, rebuilt and retyped
//! - Reports render into a cell grid that can be read back
//! - Validation failures of a committing transaction flow through
//!   subscribed [`FailureProcessor`]s before they are posted
//!
//! [`InMemoryDocument`] implements the whole surface and backs the tests.

mod batch;
mod document;
mod error;
mod failure;
mod memory;

pub use batch::Batch;
pub use document::{
    AttributeOwner, BatchKind, BatchStatus, Document, ReportField, ResolvedAttribute,
    SchedulableField, TableBounds,
};
pub use error::{DocumentError, DocumentResult};
pub use failure::{Failure, FailureKind, FailureProcessor, FailureSet, SubscriptionId};
pub use memory::{InMemoryDocument, Report, SortKey};
