//! Ordering and mark-assignment engine for ordermark.
//!
//! Assigns sequential marks to the entities of a document in a visiting
//! order that matches what the user sees: the row order of a report, the
//! placement of entities picked in a view, or the crossings of a drawn path.
//!
//! # Architecture
//!
//! A run has two phases:
//!
//! 1. **Resolve**: a resolver derives the visiting order. Report resolvers
//!    may probe the document inside batches they roll back
//! 2. **Write**: [`MarkWriter`] applies the [`sequence`] of values in one
//!    transaction while a [`ConflictSuppressor`] dismisses the duplicate-value
//!    failures this causes. Writes blocked by group constraints are handed to
//!    the [`GroupRewriteCoordinator`]
//!
//! [`NumberingService`] drives both phases; [`run_command`] wraps a run for
//! hosts that invoke it as a command.
//!
//! # Example
//!
//! ```
//! use ordermark_document::{InMemoryDocument, Report};
//! use ordermark_engine::{NumberingService, ReportNumbering};
//! use ordermark_model::{AttributeDef, BuiltinAttribute, Entity};
//!
//! let mut doc = InMemoryDocument::new();
//! let door = doc.add_entity(
//!     Entity::new("Doors").with_attribute(AttributeDef::builtin(BuiltinAttribute::Mark), ""),
//! );
//! let report = doc.add_report(Report::new("Door Schedule").with_category("Doors"));
//!
//! let service = NumberingService::default();
//! let outcome = service
//!     .number_in_report(&mut doc, report, &ReportNumbering::default())
//!     .unwrap();
//! assert_eq!(outcome.updated(), vec![door]);
//! ```

pub mod catalog;
pub mod command;
pub mod config;
mod error;
pub mod group_rewrite;
pub mod resolve;
pub mod selection;
pub mod sequence;
pub mod service;
pub mod suppressor;
pub mod writer;

pub use catalog::{AttributeCatalog, CatalogEntry};
pub use command::{run_command, CommandOutcome};
pub use config::{
    EngineConfig, LocationOrder, NumberingOptions, OrderDirection, ReportNumbering,
    ReportOrderStrategy, SelectionMode, ViewNumbering,
};
pub use error::{EngineError, EngineResult};
pub use group_rewrite::{GroupRewriteCoordinator, GroupSnapshot, PendingWrite};
pub use resolve::{
    report_resolver, DirectQueryOrderResolver, PathOrderResolver, ProbeOrderResolver,
    ReportOrderResolver, RowBucket, SpatialOrderResolver,
};
pub use selection::Selection;
pub use sequence::MarkAssignment;
pub use service::NumberingService;
pub use suppressor::ConflictSuppressor;
pub use writer::{MarkWriter, ReportEntry, Severity, WriteOutcome, WritePass, WriteReport};
