//! Shared fixtures for engine tests.

#![allow(dead_code)]

use glam::DVec3;
use ordermark_document::{
    AttributeOwner, BatchKind, BatchStatus, Document, DocumentError, DocumentResult, FailureProcessor,
    InMemoryDocument, Report, ReportField, ResolvedAttribute, SchedulableField, SubscriptionId,
    TableBounds,
};
use ordermark_model::{AttributeDef, AttributeValue, BuiltinAttribute, ElementType, Entity, Location};
use ordermark_types::{ElementTypeId, EntityId, GroupId, GroupTypeId, ReportId};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Routes engine logs to the test writer. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A door with an empty mark, comments and a sortable position.
pub fn door(position: i64) -> Entity {
    Entity::new("Doors")
        .with_attribute(AttributeDef::builtin(BuiltinAttribute::Mark), "")
        .with_attribute(AttributeDef::builtin(BuiltinAttribute::InstanceComments), "")
        .with_attribute(AttributeDef::integer("Position"), position)
}

/// A door placed at `(x, y)` in plan.
pub fn door_at(x: f64, y: f64) -> Entity {
    door(0).with_location(Location::Point(DVec3::new(x, y, 0.0)))
}

/// A wall along a straight line in plan.
pub fn wall(start: (f64, f64), end: (f64, f64)) -> Entity {
    Entity::new("Walls")
        .with_attribute(AttributeDef::builtin(BuiltinAttribute::Mark), "")
        .with_location(Location::line(
            DVec3::new(start.0, start.1, 0.0),
            DVec3::new(end.0, end.1, 0.0),
        ))
}

/// Adds doors with the given positions and an itemized door report sorted by
/// position, showing mark and position.
pub fn door_schedule(doc: &mut InMemoryDocument, positions: &[i64]) -> (ReportId, Vec<EntityId>) {
    let ids = positions.iter().map(|p| doc.add_entity(door(*p))).collect();
    let report = doc.add_report(
        Report::new("Door Schedule")
            .with_category("Doors")
            .with_field("Mark")
            .with_field("Position")
            .sorted_by("Position"),
    );
    (report, ids)
}

pub fn mark_of(doc: &InMemoryDocument, id: EntityId) -> String {
    doc.display_text(id, "Mark").unwrap_or_default()
}

pub fn comments_of(doc: &InMemoryDocument, id: EntityId) -> String {
    doc.display_text(id, "Comments").unwrap_or_default()
}

/// Marks of `ids`, in the same order.
pub fn marks(doc: &InMemoryDocument, ids: &[EntityId]) -> Vec<String> {
    ids.iter().map(|id| mark_of(doc, *id)).collect()
}

/// A host that renders reports but cannot report row membership, so report
/// runs have to probe.
#[derive(Debug, Default)]
pub struct OpaqueHost(pub InMemoryDocument);

/// An [`OpaqueHost`] whose `fail_on`-th call to `regenerate` (1-based) fails.
#[derive(Debug, Default)]
pub struct FlakyHost {
    pub inner: InMemoryDocument,
    pub fail_on: usize,
    regenerations: usize,
}

impl FlakyHost {
    pub fn failing_on(fail_on: usize) -> Self {
        Self {
            fail_on,
            ..Self::default()
        }
    }
}

macro_rules! forward {
    ($field:tt; $(fn $name:ident(&self $(, $arg:ident: $ty:ty)*) -> $ret:ty;)*) => {
        $(fn $name(&self $(, $arg: $ty)*) -> $ret { self.$field.$name($($arg),*) })*
    };
}

macro_rules! forward_mut {
    ($field:tt; $(fn $name:ident(&mut self $(, $arg:ident: $ty:ty)*) -> $ret:ty;)*) => {
        $(fn $name(&mut self $(, $arg: $ty)*) -> $ret { self.$field.$name($($arg),*) })*
    };
}

/// Implements [`Document`] by forwarding to `self.$field`, except
/// `regenerate` and `rendered_rows`, which the caller supplies or defaults.
macro_rules! opaque_document {
    ($host:ty, $field:tt, $($regenerate:tt)*) => {
        impl Document for $host {
            forward! { $field;
                fn batch_depth(&self) -> usize;
                fn entity(&self, id: EntityId) -> Option<&Entity>;
                fn element_type(&self, id: ElementTypeId) -> Option<&ElementType>;
                fn type_of(&self, entity: EntityId) -> Option<ElementTypeId>;
                fn report_entities(&self, report: ReportId) -> DocumentResult<Vec<EntityId>>;
                fn attribute(&self, owner: AttributeOwner, name: &str) -> Option<ResolvedAttribute>;
                fn builtin_attribute(&self, owner: AttributeOwner, builtin: BuiltinAttribute) -> Option<ResolvedAttribute>;
                fn group_of(&self, entity: EntityId) -> Option<GroupId>;
                fn group_members(&self, group: GroupId) -> DocumentResult<Vec<EntityId>>;
                fn group_type_of(&self, group: GroupId) -> DocumentResult<GroupTypeId>;
                fn group_type_name(&self, group_type: GroupTypeId) -> DocumentResult<String>;
                fn find_group_type(&self, name: &str) -> Option<GroupTypeId>;
                fn report_is_itemized(&self, report: ReportId) -> DocumentResult<bool>;
                fn report_fields(&self, report: ReportId) -> DocumentResult<Vec<ReportField>>;
                fn schedulable_fields(&self, report: ReportId) -> DocumentResult<Vec<SchedulableField>>;
                fn body_bounds(&self, report: ReportId) -> DocumentResult<Option<TableBounds>>;
                fn cell_text(&self, report: ReportId, row: usize, column: usize) -> DocumentResult<String>;
            }

            forward_mut! { $field;
                fn open_batch(&mut self, kind: BatchKind, name: &str) -> DocumentResult<BatchStatus>;
                fn commit_batch(&mut self) -> DocumentResult<BatchStatus>;
                fn rollback_batch(&mut self) -> DocumentResult<BatchStatus>;
                fn set_attribute(&mut self, owner: AttributeOwner, name: &str, value: AttributeValue) -> DocumentResult<()>;
                fn rename_group_type(&mut self, group_type: GroupTypeId, name: &str) -> DocumentResult<()>;
                fn ungroup(&mut self, group: GroupId) -> DocumentResult<Vec<EntityId>>;
                fn create_group(&mut self, members: &[EntityId]) -> DocumentResult<GroupId>;
                fn set_group_type(&mut self, group: GroupId, group_type: GroupTypeId) -> DocumentResult<()>;
                fn delete_group_types(&mut self, group_types: &[GroupTypeId]) -> DocumentResult<()>;
                fn add_report_field(&mut self, report: ReportId, attribute: &str) -> DocumentResult<()>;
                fn remove_report_field(&mut self, report: ReportId, attribute: &str) -> DocumentResult<()>;
                fn set_report_field_hidden(&mut self, report: ReportId, attribute: &str, hidden: bool) -> DocumentResult<()>;
                fn subscribe_failures(&mut self, processor: Box<dyn FailureProcessor>) -> SubscriptionId;
                fn unsubscribe_failures(&mut self, id: SubscriptionId) -> bool;
            }

            $($regenerate)*
        }
    };
}

opaque_document!(OpaqueHost, 0,
    fn regenerate(&mut self) -> DocumentResult<()> {
        self.0.regenerate()
    }
);

opaque_document!(FlakyHost, inner,
    fn regenerate(&mut self) -> DocumentResult<()> {
        self.regenerations += 1;
        if self.regenerations == self.fail_on {
            return Err(DocumentError::NotFound("regeneration interrupted".into()));
        }
        self.inner.regenerate()
    }
);
