//! Group-aware rewrite.
//!
//! Attributes that must stay identical across every instance of a group
//! cannot be changed on a single member. Writes like that are queued as
//! [`GroupSnapshot`]s and applied by dissolving the groups, writing the
//! members and rebuilding one group per former instance. Groups that shared
//! a type before the run share it afterwards.
//!
//! Each family of groups (same type name) runs as three transactions inside
//! one assimilated group batch:
//!
//! 1. `Ungroup`: dissolve every instance and remember its members
//! 2. `Numerate`: apply the queued writes
//! 3. `Create new group`: rebuild the instances and restore their type

use crate::error::EngineResult;
use crate::writer::{WriteOutcome, WriteReport};
use ordermark_document::{AttributeOwner, Batch, Document};
use ordermark_model::AttributeValue;
use ordermark_types::{EntityId, GroupId, GroupTypeId};
use serde::Serialize;
use tracing::{debug, info};

/// One attribute write waiting for its group to be dissolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingWrite {
    pub entity: EntityId,
    pub attribute: String,
    pub value: AttributeValue,
}

/// A group instance and the writes queued for its members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSnapshot {
    pub group: GroupId,
    /// Name of the group's type. Groups are rebuilt per type name.
    pub type_name: String,
    pub writes: Vec<PendingWrite>,
}

/// Applies queued group writes.
#[derive(Debug, Clone)]
pub struct GroupRewriteCoordinator<'a> {
    transaction_name: &'a str,
}

impl<'a> GroupRewriteCoordinator<'a> {
    pub fn new(transaction_name: &'a str) -> Self {
        Self { transaction_name }
    }

    /// Rewrites every snapshot, recording the final outcome of each queued
    /// write in `report`.
    pub fn rewrite(
        &self,
        doc: &mut dyn Document,
        snapshots: Vec<GroupSnapshot>,
        report: &mut WriteReport,
    ) -> EngineResult<()> {
        if snapshots.is_empty() {
            return Ok(());
        }

        let mut families: Vec<(String, Vec<GroupSnapshot>)> = Vec::new();
        for snapshot in snapshots {
            match families.iter_mut().find(|(name, _)| *name == snapshot.type_name) {
                Some((_, members)) => members.push(snapshot),
                None => families.push((snapshot.type_name.clone(), vec![snapshot])),
            }
        }

        let mut outer = Batch::group(doc, &format!("{}: Groups", self.transaction_name))?;
        for (family, snapshots) in &families {
            Self::rewrite_family(&mut *outer, family, snapshots, report)?;
        }
        outer.commit()?;

        info!(families = families.len(), "Group rewrite assimilated");
        Ok(())
    }

    fn rewrite_family(
        doc: &mut dyn Document,
        family: &str,
        snapshots: &[GroupSnapshot],
        report: &mut WriteReport,
    ) -> EngineResult<()> {
        debug!(family, instances = snapshots.len(), "Rewriting group family");

        let mut tx = Batch::transaction(&mut *doc, "Ungroup")?;
        let mut member_lists = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            member_lists.push(tx.ungroup(snapshot.group)?);
        }
        tx.commit()?;

        let mut tx = Batch::transaction(&mut *doc, "Numerate")?;
        for write in snapshots.iter().flat_map(|s| &s.writes) {
            let outcome = match tx.set_attribute(
                AttributeOwner::Instance(write.entity),
                &write.attribute,
                write.value.clone(),
            ) {
                Ok(()) => WriteOutcome::Updated,
                Err(e) => WriteOutcome::Error(e.to_string()),
            };
            report.record(write.entity, outcome);
        }
        tx.commit()?;

        let mut tx = Batch::transaction(&mut *doc, "Create new group")?;
        let mut family_type: Option<GroupTypeId> = None;
        let mut redundant = Vec::new();
        for members in &member_lists {
            let group = tx.create_group(members)?;
            let generated = tx.group_type_of(group)?;
            match family_type {
                Some(existing) => {
                    tx.set_group_type(group, existing)?;
                    redundant.push(generated);
                }
                None => match tx.find_group_type(family) {
                    Some(existing) => {
                        tx.set_group_type(group, existing)?;
                        redundant.push(generated);
                        family_type = Some(existing);
                    }
                    None => {
                        tx.rename_group_type(generated, family)?;
                        family_type = Some(generated);
                    }
                },
            }
        }
        if !redundant.is_empty() {
            tx.delete_group_types(&redundant)?;
        }
        tx.commit()?;

        debug!(family, rebuilt = member_lists.len(), "Group family rebuilt");
        Ok(())
    }
}
