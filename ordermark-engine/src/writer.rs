//! Transactional mark writer.
//!
//! Applies a sequence of [`MarkAssignment`]s inside one committed
//! transaction. Individual entities never fail the batch: each gets a
//! [`WriteOutcome`] and the run's [`WriteReport`] aggregates them.

use crate::config::NumberingOptions;
use crate::error::EngineResult;
use crate::group_rewrite::{GroupSnapshot, PendingWrite};
use crate::sequence::MarkAssignment;
use ordermark_document::{AttributeOwner, Batch, Document, DocumentError, ResolvedAttribute};
use ordermark_model::{AttributeDef, AttributeLevel, AttributeValue, DisplayUnit, StorageKind};
use ordermark_types::{ElementTypeId, EntityId, GroupId};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// What happened to one entity during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "message")]
pub enum WriteOutcome {
    Updated,
    /// The target attribute is read-only.
    ReadOnly,
    /// The entity has no target attribute, or its type was already written.
    Skipped,
    /// Queued for the group rewrite.
    Deferred,
    /// The host refused the write.
    Error(String),
}

/// Severity of an aggregated report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
}

/// Entities sharing one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub severity: Severity,
    pub message: String,
    pub entities: Vec<EntityId>,
}

/// Per-entity outcomes of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WriteReport {
    target: String,
    outcomes: Vec<(EntityId, WriteOutcome)>,
}

impl WriteReport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            outcomes: Vec::new(),
        }
    }

    /// Records an outcome, replacing an earlier one for the same entity.
    pub fn record(&mut self, entity: EntityId, outcome: WriteOutcome) {
        match self.outcomes.iter_mut().find(|(id, _)| *id == entity) {
            Some((_, existing)) => *existing = outcome,
            None => self.outcomes.push((entity, outcome)),
        }
    }

    pub fn outcome(&self, entity: EntityId) -> Option<&WriteOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| *id == entity)
            .map(|(_, o)| o)
    }

    pub fn outcomes(&self) -> &[(EntityId, WriteOutcome)] {
        &self.outcomes
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn matching(&self, pred: impl Fn(&WriteOutcome) -> bool) -> Vec<EntityId> {
        self.outcomes
            .iter()
            .filter(|(_, o)| pred(o))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn updated(&self) -> Vec<EntityId> {
        self.matching(|o| *o == WriteOutcome::Updated)
    }

    pub fn read_only(&self) -> Vec<EntityId> {
        self.matching(|o| *o == WriteOutcome::ReadOnly)
    }

    pub fn skipped(&self) -> Vec<EntityId> {
        self.matching(|o| *o == WriteOutcome::Skipped)
    }

    pub fn deferred(&self) -> Vec<EntityId> {
        self.matching(|o| *o == WriteOutcome::Deferred)
    }

    pub fn errors(&self) -> Vec<(EntityId, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(id, o)| match o {
                WriteOutcome::Error(message) => Some((*id, message.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, o)| matches!(o, WriteOutcome::Error(_)))
    }

    /// Read-only and error outcomes grouped by message, in first-seen order.
    pub fn entries(&self) -> Vec<ReportEntry> {
        let mut entries: Vec<ReportEntry> = Vec::new();
        for (id, outcome) in &self.outcomes {
            let (severity, message) = match outcome {
                WriteOutcome::ReadOnly => (
                    Severity::Info,
                    format!(
                        "Attribute \"{}\" is read-only on the following elements",
                        self.target
                    ),
                ),
                WriteOutcome::Error(e) => (
                    Severity::Error,
                    format!("Errors occurred while changing attribute values: {e}"),
                ),
                _ => continue,
            };
            match entries.iter_mut().find(|e| e.message == message) {
                Some(entry) => entry.entities.push(*id),
                None => entries.push(ReportEntry {
                    severity,
                    message,
                    entities: vec![*id],
                }),
            }
        }
        entries
    }
}

/// Looks up the target on the instance, then on its type when allowed.
pub fn resolve_target(
    doc: &dyn Document,
    entity: EntityId,
    name: &str,
    allow_type_level: bool,
) -> Option<ResolvedAttribute> {
    doc.attribute(AttributeOwner::Instance(entity), name).or_else(|| {
        if !allow_type_level {
            return None;
        }
        let type_id = doc.type_of(entity)?;
        doc.attribute(AttributeOwner::Type(type_id), name)
    })
}

/// The stored value for mark `number` in an attribute described by `def`.
pub fn format_value(def: &AttributeDef, options: &NumberingOptions, number: i64) -> AttributeValue {
    match def.storage {
        StorageKind::Integer => AttributeValue::Integer(number),
        StorageKind::Double => {
            let unit = def.unit.unwrap_or(DisplayUnit::Unitless);
            AttributeValue::Double(unit.to_internal(number as f64))
        }
        StorageKind::Text => {
            AttributeValue::Text(format!("{}{number}{}", options.prefix, options.suffix))
        }
    }
}

/// Result of a writer pass: outcomes plus the writes deferred to group rewriting.
#[derive(Debug, Default)]
pub struct WritePass {
    pub report: WriteReport,
    pub deferred: Vec<GroupSnapshot>,
}

/// Writes marks in one transaction.
#[derive(Debug, Clone)]
pub struct MarkWriter<'a> {
    options: &'a NumberingOptions,
    allow_type_level: bool,
    rewrite_groups: bool,
}

impl<'a> MarkWriter<'a> {
    pub fn new(options: &'a NumberingOptions) -> Self {
        Self {
            options,
            allow_type_level: false,
            rewrite_groups: true,
        }
    }

    /// Falls back to the type's attribute when the instance lacks the target.
    #[must_use]
    pub fn allow_type_level(mut self, allow: bool) -> Self {
        self.allow_type_level = allow;
        self
    }

    /// Defers grouped writes to the group rewrite instead of failing them.
    #[must_use]
    pub fn rewrite_groups(mut self, rewrite: bool) -> Self {
        self.rewrite_groups = rewrite;
        self
    }

    pub fn write(
        &self,
        doc: &mut dyn Document,
        assignments: &[MarkAssignment],
        transaction_name: &str,
    ) -> EngineResult<WritePass> {
        let mut pass = WritePass {
            report: WriteReport::new(&self.options.target),
            deferred: Vec::new(),
        };
        let mut written_types: HashSet<ElementTypeId> = HashSet::new();

        let mut tx = Batch::transaction(doc, transaction_name)?;
        for assignment in assignments {
            let entity = assignment.entity;
            let type_id = tx.type_of(entity);
            if type_id.is_some_and(|t| written_types.contains(&t)) {
                pass.report.record(entity, WriteOutcome::Skipped);
                continue;
            }

            let Some(target) =
                resolve_target(&*tx, entity, &self.options.target, self.allow_type_level)
            else {
                debug!(%entity, target = %self.options.target, "Entity has no target attribute");
                pass.report.record(entity, WriteOutcome::Skipped);
                continue;
            };

            if target.level() == AttributeLevel::Type {
                written_types.extend(type_id);
            }
            if target.def.read_only {
                pass.report.record(entity, WriteOutcome::ReadOnly);
                continue;
            }

            let value = format_value(&target.def, self.options, assignment.value);

            if target.level() == AttributeLevel::Instance && !target.def.writable_in_group() {
                if let Some(group) = tx.group_of(entity) {
                    let outcome = if self.rewrite_groups {
                        queue_group_write(&mut pass.deferred, &*tx, group, entity, &target, value)?;
                        WriteOutcome::Deferred
                    } else {
                        WriteOutcome::Error(
                            DocumentError::GroupedAttribute(target.def.name.clone()).to_string(),
                        )
                    };
                    pass.report.record(entity, outcome);
                    continue;
                }
            }

            let outcome = match tx.set_attribute(target.owner, &target.def.name, value) {
                Ok(()) => WriteOutcome::Updated,
                Err(DocumentError::Canceled) => WriteOutcome::Skipped,
                Err(e) => WriteOutcome::Error(e.to_string()),
            };
            pass.report.record(entity, outcome);
        }
        tx.commit()?;

        info!(
            target = %self.options.target,
            updated = pass.report.updated().len(),
            read_only = pass.report.read_only().len(),
            deferred = pass.report.deferred().len(),
            errors = pass.report.errors().len(),
            "Mark transaction committed"
        );
        Ok(pass)
    }
}

fn queue_group_write(
    deferred: &mut Vec<GroupSnapshot>,
    doc: &dyn Document,
    group: GroupId,
    entity: EntityId,
    target: &ResolvedAttribute,
    value: AttributeValue,
) -> EngineResult<()> {
    let write = PendingWrite {
        entity,
        attribute: target.def.name.clone(),
        value,
    };
    if let Some(snapshot) = deferred.iter_mut().find(|s| s.group == group) {
        snapshot.writes.push(write);
        return Ok(());
    }

    let type_name = doc
        .group_type_of(group)
        .and_then(|t| doc.group_type_name(t))?;
    deferred.push(GroupSnapshot {
        group,
        type_name,
        writes: vec![write],
    });
    Ok(())
}
