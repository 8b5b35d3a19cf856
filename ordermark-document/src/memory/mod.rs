//! In-memory host document.
//!
//! A complete [`Document`] over plain vectors. Batches snapshot the model
//! when they open and restore the snapshot on rollback. Committing a
//! top-level transaction runs host validation (duplicate marks), hands the
//! failures to subscribed processors, posts what survives and re-renders
//! every report.

mod report;

pub use report::{Report, SortKey};

use crate::document::{
    AttributeOwner, BatchKind, BatchStatus, Document, ReportField, ResolvedAttribute,
    SchedulableField, TableBounds,
};
use crate::error::{DocumentError, DocumentResult};
use crate::failure::{Failure, FailureKind, FailureProcessor, FailureSet, SubscriptionId};
use ordermark_model::{
    Attribute, AttributeDef, AttributeLevel, AttributeValue, BuiltinAttribute, ElementType,
    Entity,
};
use ordermark_types::{ElementTypeId, EntityId, GroupId, GroupTypeId, ReportId};
use report::RenderedTable;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct GroupRecord {
    id: GroupId,
    type_id: GroupTypeId,
    members: Vec<EntityId>,
}

#[derive(Debug, Clone)]
struct GroupTypeRecord {
    id: GroupTypeId,
    name: String,
}

/// Everything a rollback restores.
#[derive(Debug, Clone, Default)]
struct ModelState {
    entities: Vec<Entity>,
    types: Vec<ElementType>,
    groups: Vec<GroupRecord>,
    group_types: Vec<GroupTypeRecord>,
    reports: Vec<Report>,
    rendered: HashMap<ReportId, RenderedTable>,
    generated_types: u32,
}

#[derive(Debug)]
struct Frame {
    kind: BatchKind,
    name: String,
    snapshot: ModelState,
}

/// A host document held entirely in memory.
#[derive(Default)]
pub struct InMemoryDocument {
    state: ModelState,
    frames: Vec<Frame>,
    processors: Vec<(SubscriptionId, Box<dyn FailureProcessor>)>,
    next_subscription: u64,
    queued: Vec<Failure>,
    posted: Vec<Failure>,
}

impl fmt::Debug for InMemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryDocument")
            .field("entities", &self.state.entities.len())
            .field("groups", &self.state.groups.len())
            .field("reports", &self.state.reports.len())
            .field("open_batches", &self.frames.len())
            .field("subscriptions", &self.processors.len())
            .finish()
    }
}

impl InMemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Setup ────────────────────────────────────────────────────

    /// Adds an element type, outside of any batch.
    pub fn add_type(&mut self, element_type: ElementType) -> ElementTypeId {
        let id = element_type.id;
        self.state.types.push(element_type);
        self.rerender();
        id
    }

    /// Adds an entity, outside of any batch. Any group id it carries is ignored;
    /// use [`InMemoryDocument::add_group`] to group entities.
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        entity.group_id = None;
        let id = entity.id;
        self.state.entities.push(entity);
        self.rerender();
        id
    }

    /// Groups entities under the group type `type_name`, creating the type
    /// when it does not exist yet.
    pub fn add_group(&mut self, type_name: &str, members: &[EntityId]) -> DocumentResult<GroupId> {
        let type_id = match self.find_group_type(type_name) {
            Some(id) => id,
            None => {
                let id = GroupTypeId::new();
                self.state.group_types.push(GroupTypeRecord {
                    id,
                    name: type_name.to_string(),
                });
                id
            }
        };
        self.place_group(type_id, members)
    }

    /// Adds a report and renders it.
    pub fn add_report(&mut self, report: Report) -> ReportId {
        let id = report.id;
        let table = report::render(&report, &self.state.entities, &self.state.types);
        self.state.rendered.insert(id, table);
        self.state.reports.push(report);
        id
    }

    /// Queues a failure that the next committing transaction reports.
    pub fn queue_failure(&mut self, failure: Failure) {
        self.queued.push(failure);
    }

    // ── Inspection ───────────────────────────────────────────────

    /// Failures that survived processing and were shown to the user.
    pub fn posted_warnings(&self) -> &[Failure] {
        &self.posted
    }

    pub fn take_posted_warnings(&mut self) -> Vec<Failure> {
        std::mem::take(&mut self.posted)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.state.entities
    }

    pub fn report(&self, id: ReportId) -> Option<&Report> {
        self.state.reports.iter().find(|r| r.id == id)
    }

    /// Ids of all placed groups.
    pub fn groups(&self) -> Vec<GroupId> {
        self.state.groups.iter().map(|g| g.id).collect()
    }

    /// Ids of all group types, placed or not.
    pub fn group_types(&self) -> Vec<GroupTypeId> {
        self.state.group_types.iter().map(|t| t.id).collect()
    }

    pub fn subscription_count(&self) -> usize {
        self.processors.len()
    }

    /// Text of an entity's instance attribute as a report would show it.
    pub fn display_text(&self, entity: EntityId, name: &str) -> Option<String> {
        self.entity(entity)
            .and_then(|e| e.attribute(name))
            .map(|a| a.value.display_text(a.def.unit))
    }

    // ── Internals ────────────────────────────────────────────────

    fn require_batch(&self) -> DocumentResult<()> {
        if self.frames.is_empty() {
            return Err(DocumentError::NoOpenBatch);
        }
        Ok(())
    }

    fn find_report(&self, id: ReportId) -> DocumentResult<&Report> {
        self.report(id)
            .ok_or_else(|| DocumentError::NotFound(format!("report {id}")))
    }

    fn find_report_mut(&mut self, id: ReportId) -> DocumentResult<&mut Report> {
        self.state
            .reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DocumentError::NotFound(format!("report {id}")))
    }

    fn find_group(&self, id: GroupId) -> DocumentResult<&GroupRecord> {
        self.state
            .groups
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| DocumentError::NotFound(format!("group {id}")))
    }

    fn find_group_type_record(&self, id: GroupTypeId) -> DocumentResult<&GroupTypeRecord> {
        self.state
            .group_types
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| DocumentError::NotFound(format!("group type {id}")))
    }

    fn place_group(&mut self, type_id: GroupTypeId, members: &[EntityId]) -> DocumentResult<GroupId> {
        if members.is_empty() {
            return Err(DocumentError::EmptyGroup);
        }
        for id in members {
            let entity = self
                .entity(*id)
                .ok_or_else(|| DocumentError::NotFound(format!("entity {id}")))?;
            if entity.group_id.is_some() {
                return Err(DocumentError::AlreadyGrouped(*id));
            }
        }

        let group = GroupId::new();
        for entity in &mut self.state.entities {
            if members.contains(&entity.id) {
                entity.group_id = Some(group);
            }
        }
        self.state.groups.push(GroupRecord {
            id: group,
            type_id,
            members: members.to_vec(),
        });
        Ok(group)
    }

    fn table(&self, id: ReportId) -> DocumentResult<Cow<'_, RenderedTable>> {
        if let Some(table) = self.state.rendered.get(&id) {
            return Ok(Cow::Borrowed(table));
        }
        let report = self.find_report(id)?;
        Ok(Cow::Owned(report::render(
            report,
            &self.state.entities,
            &self.state.types,
        )))
    }

    fn rerender(&mut self) {
        let state = &mut self.state;
        state.rendered = state
            .reports
            .iter()
            .map(|r| (r.id, report::render(r, &state.entities, &state.types)))
            .collect();
    }

    /// Duplicate built-in marks among entities whose mark changed since `before`.
    fn duplicate_marks(&self, before: &ModelState) -> Vec<Failure> {
        let mark_of = |e: &Entity| {
            e.builtin(BuiltinAttribute::Mark)
                .map(|a| a.value.display_text(None))
                .filter(|v| !v.is_empty())
        };

        let mut holders: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
        for entity in &self.state.entities {
            if let Some(mark) = mark_of(entity) {
                holders.entry(mark).or_default().push(entity.id);
            }
        }

        let mut changed: Vec<String> = Vec::new();
        for entity in &self.state.entities {
            let previous = before
                .entities
                .iter()
                .find(|e| e.id == entity.id)
                .and_then(mark_of);
            if let Some(mark) = mark_of(entity) {
                if previous.as_ref() != Some(&mark) && !changed.contains(&mark) {
                    changed.push(mark);
                }
            }
        }

        changed
            .into_iter()
            .filter_map(|mark| {
                let ids = holders.get(&mark)?;
                (ids.len() > 1).then(|| {
                    Failure::new(
                        FailureKind::DuplicateValue,
                        format!("Elements have duplicate \"Mark\" values: \"{mark}\""),
                    )
                    .with_elements(ids.clone())
                })
            })
            .collect()
    }

    fn finish_transaction(&mut self, before: &ModelState) {
        let mut failures = self.duplicate_marks(before);
        failures.append(&mut self.queued);
        if !failures.is_empty() {
            let mut set = FailureSet::new(failures);
            for (_, processor) in &mut self.processors {
                processor.process(&mut set);
            }
            let remaining = set.into_remaining();
            if !remaining.is_empty() {
                info!(count = remaining.len(), "Posting transaction warnings");
            }
            self.posted.extend(remaining);
        }
        self.rerender();
    }

    fn resolve(owner: AttributeOwner, attribute: &Attribute) -> ResolvedAttribute {
        ResolvedAttribute {
            owner,
            def: attribute.def.clone(),
            value: attribute.value.clone(),
        }
    }
}

fn check_write(def: &AttributeDef, value: &AttributeValue) -> DocumentResult<()> {
    if def.read_only {
        return Err(DocumentError::ReadOnly(def.name.clone()));
    }
    if !value.fits(def.storage) {
        return Err(DocumentError::TypeMismatch {
            name: def.name.clone(),
            expected: def.storage,
        });
    }
    Ok(())
}

impl Document for InMemoryDocument {
    // ── Batches ──────────────────────────────────────────────────

    fn open_batch(&mut self, kind: BatchKind, name: &str) -> DocumentResult<BatchStatus> {
        let parent = self.frames.last().map(|f| f.kind);
        let allowed = match kind {
            BatchKind::Group | BatchKind::Transaction => {
                matches!(parent, None | Some(BatchKind::Group))
            }
            BatchKind::SubTransaction => matches!(
                parent,
                Some(BatchKind::Transaction | BatchKind::SubTransaction)
            ),
        };
        if !allowed {
            return Err(DocumentError::BatchNesting(format!(
                "cannot open {kind:?} \"{name}\" inside {parent:?}"
            )));
        }

        debug!(?kind, name, depth = self.frames.len(), "Opening batch");
        self.frames.push(Frame {
            kind,
            name: name.to_string(),
            snapshot: self.state.clone(),
        });
        Ok(BatchStatus::Started)
    }

    fn commit_batch(&mut self) -> DocumentResult<BatchStatus> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| DocumentError::BatchNesting("no batch to commit".into()))?;
        debug!(kind = ?frame.kind, name = %frame.name, "Committing batch");

        if frame.kind == BatchKind::Transaction {
            self.finish_transaction(&frame.snapshot);
        }
        Ok(BatchStatus::Committed)
    }

    fn rollback_batch(&mut self) -> DocumentResult<BatchStatus> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| DocumentError::BatchNesting("no batch to roll back".into()))?;
        debug!(kind = ?frame.kind, name = %frame.name, "Rolling back batch");

        self.state = frame.snapshot;
        Ok(BatchStatus::RolledBack)
    }

    fn batch_depth(&self) -> usize {
        self.frames.len()
    }

    // ── Elements ─────────────────────────────────────────────────

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.state.entities.iter().find(|e| e.id == id)
    }

    fn element_type(&self, id: ElementTypeId) -> Option<&ElementType> {
        self.state.types.iter().find(|t| t.id == id)
    }

    fn type_of(&self, entity: EntityId) -> Option<ElementTypeId> {
        self.entity(entity).and_then(|e| e.type_id)
    }

    fn report_entities(&self, report: ReportId) -> DocumentResult<Vec<EntityId>> {
        let report = self.find_report(report)?;
        Ok(self
            .state
            .entities
            .iter()
            .filter(|e| report.shows(e))
            .map(|e| e.id)
            .collect())
    }

    // ── Attributes ───────────────────────────────────────────────

    fn attribute(&self, owner: AttributeOwner, name: &str) -> Option<ResolvedAttribute> {
        let attribute = match owner {
            AttributeOwner::Instance(id) => self.entity(id)?.attribute(name),
            AttributeOwner::Type(id) => self.element_type(id)?.attribute(name),
        };
        attribute.map(|a| Self::resolve(owner, a))
    }

    fn builtin_attribute(
        &self,
        owner: AttributeOwner,
        builtin: BuiltinAttribute,
    ) -> Option<ResolvedAttribute> {
        let attribute = match owner {
            AttributeOwner::Instance(id) => self.entity(id)?.builtin(builtin),
            AttributeOwner::Type(id) => self.element_type(id)?.builtin(builtin),
        };
        attribute.map(|a| Self::resolve(owner, a))
    }

    fn set_attribute(
        &mut self,
        owner: AttributeOwner,
        name: &str,
        value: AttributeValue,
    ) -> DocumentResult<()> {
        self.require_batch()?;
        let missing = || DocumentError::AttributeNotFound {
            owner: owner.to_string(),
            name: name.to_string(),
        };

        match owner {
            AttributeOwner::Instance(id) => {
                let entity = self
                    .state
                    .entities
                    .iter_mut()
                    .find(|e| e.id == id)
                    .ok_or_else(|| DocumentError::NotFound(format!("entity {id}")))?;
                let grouped = entity.group_id.is_some();
                let attribute = entity.attribute_mut(name).ok_or_else(missing)?;
                check_write(&attribute.def, &value)?;
                if grouped && !attribute.def.writable_in_group() {
                    return Err(DocumentError::GroupedAttribute(name.to_string()));
                }
                attribute.value = value;
            }
            AttributeOwner::Type(id) => {
                let element_type = self
                    .state
                    .types
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| DocumentError::NotFound(format!("type {id}")))?;
                let attribute = element_type.attribute_mut(name).ok_or_else(missing)?;
                check_write(&attribute.def, &value)?;
                attribute.value = value;
            }
        }
        Ok(())
    }

    // ── Groups ───────────────────────────────────────────────────

    fn group_of(&self, entity: EntityId) -> Option<GroupId> {
        self.entity(entity).and_then(|e| e.group_id)
    }

    fn group_members(&self, group: GroupId) -> DocumentResult<Vec<EntityId>> {
        Ok(self.find_group(group)?.members.clone())
    }

    fn group_type_of(&self, group: GroupId) -> DocumentResult<GroupTypeId> {
        Ok(self.find_group(group)?.type_id)
    }

    fn group_type_name(&self, group_type: GroupTypeId) -> DocumentResult<String> {
        Ok(self.find_group_type_record(group_type)?.name.clone())
    }

    fn find_group_type(&self, name: &str) -> Option<GroupTypeId> {
        self.state
            .group_types
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
    }

    fn rename_group_type(&mut self, group_type: GroupTypeId, name: &str) -> DocumentResult<()> {
        self.require_batch()?;
        if self
            .state
            .group_types
            .iter()
            .any(|t| t.name == name && t.id != group_type)
        {
            return Err(DocumentError::DuplicateName(name.to_string()));
        }
        let record = self
            .state
            .group_types
            .iter_mut()
            .find(|t| t.id == group_type)
            .ok_or_else(|| DocumentError::NotFound(format!("group type {group_type}")))?;
        record.name = name.to_string();
        Ok(())
    }

    fn ungroup(&mut self, group: GroupId) -> DocumentResult<Vec<EntityId>> {
        self.require_batch()?;
        let index = self
            .state
            .groups
            .iter()
            .position(|g| g.id == group)
            .ok_or_else(|| DocumentError::NotFound(format!("group {group}")))?;
        let record = self.state.groups.remove(index);
        for entity in &mut self.state.entities {
            if entity.group_id == Some(group) {
                entity.group_id = None;
            }
        }
        Ok(record.members)
    }

    fn create_group(&mut self, members: &[EntityId]) -> DocumentResult<GroupId> {
        self.require_batch()?;
        if members.is_empty() {
            return Err(DocumentError::EmptyGroup);
        }
        let name = loop {
            self.state.generated_types += 1;
            let candidate = format!("Group {}", self.state.generated_types);
            if self.find_group_type(&candidate).is_none() {
                break candidate;
            }
        };
        let type_id = GroupTypeId::new();
        self.state.group_types.push(GroupTypeRecord { id: type_id, name });
        self.place_group(type_id, members)
    }

    fn set_group_type(&mut self, group: GroupId, group_type: GroupTypeId) -> DocumentResult<()> {
        self.require_batch()?;
        self.find_group_type_record(group_type)?;
        let record = self
            .state
            .groups
            .iter_mut()
            .find(|g| g.id == group)
            .ok_or_else(|| DocumentError::NotFound(format!("group {group}")))?;
        record.type_id = group_type;
        Ok(())
    }

    fn delete_group_types(&mut self, group_types: &[GroupTypeId]) -> DocumentResult<()> {
        self.require_batch()?;
        for id in group_types {
            self.find_group_type_record(*id)?;
            if self.state.groups.iter().any(|g| g.type_id == *id) {
                return Err(DocumentError::GroupTypeInUse(*id));
            }
        }
        self.state
            .group_types
            .retain(|t| !group_types.contains(&t.id));
        Ok(())
    }

    // ── Reports ──────────────────────────────────────────────────

    fn report_is_itemized(&self, report: ReportId) -> DocumentResult<bool> {
        Ok(self.find_report(report)?.itemized)
    }

    fn report_fields(&self, report: ReportId) -> DocumentResult<Vec<ReportField>> {
        Ok(self.find_report(report)?.fields.clone())
    }

    fn schedulable_fields(&self, report: ReportId) -> DocumentResult<Vec<SchedulableField>> {
        let report = self.find_report(report)?;
        let mut fields: Vec<SchedulableField> = Vec::new();
        let mut push = |name: &str, level: AttributeLevel| {
            if !fields.iter().any(|f| f.name == name && f.level == level) {
                fields.push(SchedulableField {
                    name: name.to_string(),
                    level,
                });
            }
        };

        for entity in self.state.entities.iter().filter(|e| report.shows(e)) {
            for attribute in &entity.attributes {
                push(attribute.name(), AttributeLevel::Instance);
            }
            let element_type = entity
                .type_id
                .and_then(|tid| self.state.types.iter().find(|t| t.id == tid));
            if let Some(element_type) = element_type {
                for attribute in &element_type.attributes {
                    push(attribute.name(), AttributeLevel::Type);
                }
            }
        }
        Ok(fields)
    }

    fn add_report_field(&mut self, report: ReportId, attribute: &str) -> DocumentResult<()> {
        self.require_batch()?;
        let report = self.find_report_mut(report)?;
        if report.field_index(attribute).is_some() {
            return Err(DocumentError::DuplicateName(attribute.to_string()));
        }
        report.fields.push(ReportField::new(attribute));
        Ok(())
    }

    fn remove_report_field(&mut self, report: ReportId, attribute: &str) -> DocumentResult<()> {
        self.require_batch()?;
        let report = self.find_report_mut(report)?;
        let index = report
            .field_index(attribute)
            .ok_or_else(|| DocumentError::NotFound(format!("report field {attribute}")))?;
        report.fields.remove(index);
        Ok(())
    }

    fn set_report_field_hidden(
        &mut self,
        report: ReportId,
        attribute: &str,
        hidden: bool,
    ) -> DocumentResult<()> {
        self.require_batch()?;
        let report = self.find_report_mut(report)?;
        let index = report
            .field_index(attribute)
            .ok_or_else(|| DocumentError::NotFound(format!("report field {attribute}")))?;
        report.fields[index].hidden = hidden;
        Ok(())
    }

    fn regenerate(&mut self) -> DocumentResult<()> {
        self.rerender();
        Ok(())
    }

    fn body_bounds(&self, report: ReportId) -> DocumentResult<Option<TableBounds>> {
        let table = self.table(report)?;
        if table.headers.is_empty() {
            return Ok(None);
        }
        Ok(Some(TableBounds {
            first_row: 0,
            last_row: table.row_count() - 1,
            first_column: 0,
            last_column: table.headers.len() - 1,
        }))
    }

    fn cell_text(&self, report: ReportId, row: usize, column: usize) -> DocumentResult<String> {
        let table = self.table(report)?;
        table
            .cell(row, column)
            .map(str::to_string)
            .ok_or_else(|| DocumentError::NotFound(format!("cell ({row}, {column})")))
    }

    fn rendered_rows(&self, report: ReportId) -> Option<Vec<Vec<EntityId>>> {
        let report = self.report(report)?;
        let table = report::render(report, &self.state.entities, &self.state.types);
        Some(table.rows.into_iter().map(|r| r.members).collect())
    }

    // ── Failures ─────────────────────────────────────────────────

    fn subscribe_failures(&mut self, processor: Box<dyn FailureProcessor>) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.processors.push((id, processor));
        id
    }

    fn unsubscribe_failures(&mut self, id: SubscriptionId) -> bool {
        let before = self.processors.len();
        self.processors.retain(|(sid, _)| *sid != id);
        self.processors.len() != before
    }
}
