//! The host document surface consumed by the engine.

use crate::error::DocumentResult;
use crate::failure::{FailureProcessor, SubscriptionId};
use ordermark_model::{
    AttributeDef, AttributeLevel, AttributeValue, BuiltinAttribute, ElementType, Entity,
};
use ordermark_types::{ElementTypeId, EntityId, GroupId, GroupTypeId, ReportId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Kind of a transactional batch. Batches nest `Group ⊃ Transaction ⊃ SubTransaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    /// Bundles several transactions; committing it assimilates them into one undo step.
    Group,
    /// A top-level unit of change. Validation failures are processed when it commits.
    Transaction,
    /// A nested step inside a transaction.
    SubTransaction,
}

/// Status reported by batch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Started,
    Committed,
    RolledBack,
}

/// The element an attribute is resolved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeOwner {
    Instance(EntityId),
    Type(ElementTypeId),
}

impl AttributeOwner {
    pub fn level(&self) -> AttributeLevel {
        match self {
            Self::Instance(_) => AttributeLevel::Instance,
            Self::Type(_) => AttributeLevel::Type,
        }
    }
}

impl fmt::Display for AttributeOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(id) => write!(f, "entity {id}"),
            Self::Type(id) => write!(f, "type {id}"),
        }
    }
}

/// An attribute as resolved on one owner at access time.
///
/// This is a copy, not a live handle. Resolve again after any mutation or
/// regeneration.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAttribute {
    pub owner: AttributeOwner,
    pub def: AttributeDef,
    pub value: AttributeValue,
}

impl ResolvedAttribute {
    pub fn level(&self) -> AttributeLevel {
        self.owner.level()
    }
}

/// A column of a report bound to an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportField {
    pub attribute: String,
    #[serde(default)]
    pub hidden: bool,
}

impl ReportField {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            hidden: false,
        }
    }
}

/// An attribute that may be added to a report as a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulableField {
    pub name: String,
    pub level: AttributeLevel,
}

/// Inclusive row/column bounds of a rendered report body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBounds {
    pub first_row: usize,
    pub last_row: usize,
    pub first_column: usize,
    pub last_column: usize,
}

impl TableBounds {
    pub fn rows(&self) -> RangeInclusive<usize> {
        self.first_row..=self.last_row
    }

    pub fn columns(&self) -> RangeInclusive<usize> {
        self.first_column..=self.last_column
    }
}

/// The host document model.
///
/// All mutation happens inside a batch opened with [`Document::open_batch`];
/// implementations refuse writes otherwise. Only one batch chain is open at a
/// time, which `&mut self` enforces.
pub trait Document {
    // ── Batches ──────────────────────────────────────────────────

    /// Opens a batch of `kind` nested in the current one.
    fn open_batch(&mut self, kind: BatchKind, name: &str) -> DocumentResult<BatchStatus>;

    /// Commits the innermost open batch.
    fn commit_batch(&mut self) -> DocumentResult<BatchStatus>;

    /// Rolls back the innermost open batch, discarding its changes.
    fn rollback_batch(&mut self) -> DocumentResult<BatchStatus>;

    /// Number of batches currently open.
    fn batch_depth(&self) -> usize;

    // ── Elements ─────────────────────────────────────────────────

    fn entity(&self, id: EntityId) -> Option<&Entity>;

    fn element_type(&self, id: ElementTypeId) -> Option<&ElementType>;

    /// Type of an entity, if it has one.
    fn type_of(&self, entity: EntityId) -> Option<ElementTypeId>;

    /// Entities shown by a report, in document order. Type definitions are
    /// never included.
    fn report_entities(&self, report: ReportId) -> DocumentResult<Vec<EntityId>>;

    // ── Attributes ───────────────────────────────────────────────

    /// Resolves an attribute by name on an instance or type.
    fn attribute(&self, owner: AttributeOwner, name: &str) -> Option<ResolvedAttribute>;

    /// Resolves a built-in attribute on an instance or type.
    fn builtin_attribute(
        &self,
        owner: AttributeOwner,
        builtin: BuiltinAttribute,
    ) -> Option<ResolvedAttribute>;

    /// Writes an attribute value. The host validates read-only, storage and
    /// group constraints and refuses the write with an error.
    fn set_attribute(
        &mut self,
        owner: AttributeOwner,
        name: &str,
        value: AttributeValue,
    ) -> DocumentResult<()>;

    // ── Groups ───────────────────────────────────────────────────

    fn group_of(&self, entity: EntityId) -> Option<GroupId>;

    fn group_members(&self, group: GroupId) -> DocumentResult<Vec<EntityId>>;

    fn group_type_of(&self, group: GroupId) -> DocumentResult<GroupTypeId>;

    fn group_type_name(&self, group_type: GroupTypeId) -> DocumentResult<String>;

    fn find_group_type(&self, name: &str) -> Option<GroupTypeId>;

    fn rename_group_type(&mut self, group_type: GroupTypeId, name: &str) -> DocumentResult<()>;

    /// Dissolves a group instance, returning its former members. The group
    /// type survives.
    fn ungroup(&mut self, group: GroupId) -> DocumentResult<Vec<EntityId>>;

    /// Creates a group from ungrouped entities under a freshly generated type.
    fn create_group(&mut self, members: &[EntityId]) -> DocumentResult<GroupId>;

    fn set_group_type(&mut self, group: GroupId, group_type: GroupTypeId) -> DocumentResult<()>;

    fn delete_group_types(&mut self, group_types: &[GroupTypeId]) -> DocumentResult<()>;

    // ── Reports ──────────────────────────────────────────────────

    /// Whether the report shows one row per entity.
    fn report_is_itemized(&self, report: ReportId) -> DocumentResult<bool>;

    fn report_fields(&self, report: ReportId) -> DocumentResult<Vec<ReportField>>;

    fn schedulable_fields(&self, report: ReportId) -> DocumentResult<Vec<SchedulableField>>;

    fn add_report_field(&mut self, report: ReportId, attribute: &str) -> DocumentResult<()>;

    fn remove_report_field(&mut self, report: ReportId, attribute: &str) -> DocumentResult<()>;

    fn set_report_field_hidden(
        &mut self,
        report: ReportId,
        attribute: &str,
        hidden: bool,
    ) -> DocumentResult<()>;

    /// Re-renders reports so cell reads reflect the current model.
    fn regenerate(&mut self) -> DocumentResult<()>;

    /// Bounds of the rendered body, `None` when the body has no columns.
    fn body_bounds(&self, report: ReportId) -> DocumentResult<Option<TableBounds>>;

    fn cell_text(&self, report: ReportId, row: usize, column: usize) -> DocumentResult<String>;

    /// Direct query of rendered row membership, top to bottom.
    ///
    /// Hosts without a rendering query return `None`; callers then fall back
    /// to probing cell text.
    fn rendered_rows(&self, report: ReportId) -> Option<Vec<Vec<EntityId>>> {
        let _ = report;
        None
    }

    // ── Failures ─────────────────────────────────────────────────

    /// Registers a processor that sees the failures of every committing transaction.
    fn subscribe_failures(&mut self, processor: Box<dyn FailureProcessor>) -> SubscriptionId;

    /// Removes a processor. Returns false if it was not registered.
    fn unsubscribe_failures(&mut self, id: SubscriptionId) -> bool;
}
