//! Report order recovered through a scratch attribute.
//!
//! Hosts that render reports but cannot say which entity landed on which row
//! are probed: marker text is written into a built-in scratch attribute,
//! the report is regenerated and its cells are read back. All probing
//! happens inside a batch that is rolled back, so the model is unchanged
//! afterwards.

use super::{ReportOrderResolver, RowBucket};
use crate::error::EngineResult;
use ordermark_document::{AttributeOwner, Batch, Document};
use ordermark_model::{AttributeValue, BuiltinAttribute};
use ordermark_types::{EntityId, ReportId};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Separates the original scratch text from the entity id token.
pub const ID_SEPARATOR: &str = "$ElementId=";

/// Marks every candidate row during the row probe.
pub const ROW_SENTINEL: &str = "$Filled$";

/// Built-in attributes usable as scratch space, most preferred first.
pub const SCRATCH_PREFERENCE: [BuiltinAttribute; 2] =
    [BuiltinAttribute::InstanceComments, BuiltinAttribute::SheetName];

/// Probes rendered report cells to recover the visiting order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeOrderResolver;

/// The scratch attribute chosen for a probe.
#[derive(Debug, Clone)]
struct Scratch {
    builtin: BuiltinAttribute,
    name: String,
}

/// Whether the report showed the scratch field before the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScratchField {
    Present,
    Added,
    Unavailable,
}

impl ProbeOrderResolver {
    /// Candidates exposing at least one scratch attribute.
    fn eligible(doc: &dyn Document, candidates: &[EntityId]) -> Vec<EntityId> {
        candidates
            .iter()
            .copied()
            .filter(|id| {
                SCRATCH_PREFERENCE.iter().any(|builtin| {
                    doc.builtin_attribute(AttributeOwner::Instance(*id), *builtin)
                        .is_some()
                })
            })
            .collect()
    }

    /// First preferred built-in that every candidate exposes.
    fn scratch(doc: &dyn Document, candidates: &[EntityId]) -> Option<Scratch> {
        let first = *candidates.first()?;
        SCRATCH_PREFERENCE.iter().find_map(|builtin| {
            let all = candidates.iter().all(|id| {
                doc.builtin_attribute(AttributeOwner::Instance(*id), *builtin)
                    .is_some()
            });
            if !all {
                return None;
            }
            let resolved = doc.builtin_attribute(AttributeOwner::Instance(first), *builtin)?;
            Some(Scratch {
                builtin: *builtin,
                name: resolved.def.name,
            })
        })
    }

    fn scratch_text(doc: &dyn Document, id: EntityId, scratch: &Scratch) -> String {
        doc.builtin_attribute(AttributeOwner::Instance(id), scratch.builtin)
            .map(|a| a.value.display_text(a.def.unit))
            .unwrap_or_default()
    }

    /// Dissolves the entity's group so its scratch attribute can be written.
    fn release(doc: &mut dyn Document, id: EntityId) {
        if let Some(group) = doc.group_of(id) {
            if let Err(e) = doc.ungroup(group) {
                warn!(entity = %id, %group, error = %e, "Could not dissolve group for probing");
            }
        }
    }

    /// Adds the scratch field to the report or unhides it.
    fn show_field(
        doc: &mut dyn Document,
        report: ReportId,
        scratch: &Scratch,
    ) -> EngineResult<ScratchField> {
        let fields = doc.report_fields(report)?;
        if let Some(field) = fields.iter().find(|f| f.attribute == scratch.name) {
            if field.hidden {
                doc.set_report_field_hidden(report, &scratch.name, false)?;
            }
            return Ok(ScratchField::Present);
        }

        let schedulable = doc.schedulable_fields(report)?;
        if !schedulable.iter().any(|f| f.name == scratch.name) {
            warn!(%report, field = %scratch.name, "Scratch field cannot be shown in report");
            return Ok(ScratchField::Unavailable);
        }
        doc.add_report_field(report, &scratch.name)?;
        Ok(ScratchField::Added)
    }

    /// Reads every body cell row-major and collects id tokens.
    fn scan_tokens(
        doc: &dyn Document,
        report: ReportId,
        candidates: &[EntityId],
    ) -> EngineResult<Vec<EntityId>> {
        let Some(bounds) = doc.body_bounds(report)? else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for row in bounds.rows() {
            for column in bounds.columns() {
                let text = doc.cell_text(report, row, column)?;
                let Some((_, token)) = text.rsplit_once(ID_SEPARATOR) else {
                    continue;
                };
                match parse_token(token) {
                    Ok(id) if !candidates.contains(&id) => {
                        warn!(%report, row, column, entity = %id, "Probe token names an unknown entity");
                    }
                    Ok(id) => {
                        if seen.insert(id) {
                            order.push(id);
                        }
                    }
                    Err(e) => {
                        warn!(%report, row, column, error = %e, "Skipping malformed probe token");
                    }
                }
            }
        }
        Ok(order)
    }

    /// Finds the rows holding the sentinel. Returns the anchor column and the
    /// body row index of each such row.
    fn anchor_rows(doc: &dyn Document, report: ReportId) -> EngineResult<Option<(usize, Vec<usize>)>> {
        let Some(bounds) = doc.body_bounds(report)? else {
            return Ok(None);
        };

        let mut anchor_column = None;
        let mut rows = Vec::new();
        for row in bounds.rows() {
            for column in bounds.columns() {
                if doc.cell_text(report, row, column)?.contains(ROW_SENTINEL) {
                    anchor_column.get_or_insert(column);
                    rows.push(row);
                    break;
                }
            }
        }
        Ok(anchor_column.map(|column| (column, rows)))
    }

    /// Restores the sentinel on the previously cleared entity and clears
    /// `entity`, in one committed sub-batch. Nothing changes when it fails.
    fn clear_sentinel(
        doc: &mut dyn Document,
        scratch: &Scratch,
        previous: Option<EntityId>,
        entity: EntityId,
    ) -> EngineResult<()> {
        let mut step = Batch::sub(doc)?;
        if let Some(previous) = previous {
            step.set_attribute(
                AttributeOwner::Instance(previous),
                &scratch.name,
                AttributeValue::text(ROW_SENTINEL),
            )?;
        }
        step.set_attribute(
            AttributeOwner::Instance(entity),
            &scratch.name,
            AttributeValue::text(""),
        )?;
        step.regenerate()?;
        step.commit()?;
        Ok(())
    }

    /// 1-based index among the sentinel rows of the first row gone blank.
    fn blank_row(
        doc: &dyn Document,
        report: ReportId,
        column: usize,
        rows: &[usize],
    ) -> EngineResult<Option<usize>> {
        for (index, row) in rows.iter().enumerate() {
            if doc.cell_text(report, *row, column)?.is_empty() {
                return Ok(Some(index + 1));
            }
        }
        Ok(None)
    }
}

impl ReportOrderResolver for ProbeOrderResolver {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn itemized_order(
        &self,
        doc: &mut dyn Document,
        report: ReportId,
        candidates: &[EntityId],
    ) -> EngineResult<Vec<EntityId>> {
        let candidates = &Self::eligible(doc, candidates);
        let Some(scratch) = Self::scratch(doc, candidates) else {
            warn!(%report, "No scratch attribute shared by all candidates; report order unavailable");
            return Ok(Vec::new());
        };
        debug!(%report, scratch = %scratch.name, candidates = candidates.len(), "Probing itemized report");

        let mut probe = Batch::transaction(doc, "Find in itemized table")?;
        for id in candidates {
            Self::release(&mut *probe, *id);
            let text = format!(
                "{}{ID_SEPARATOR}{id}",
                Self::scratch_text(&*probe, *id, &scratch)
            );
            if let Err(e) = probe.set_attribute(
                AttributeOwner::Instance(*id),
                &scratch.name,
                AttributeValue::Text(text),
            ) {
                warn!(entity = %id, error = %e, "Could not write probe token");
            }
        }

        let order = if Self::show_field(&mut *probe, report, &scratch)? == ScratchField::Unavailable {
            Vec::new()
        } else {
            probe.regenerate()?;
            Self::scan_tokens(&*probe, report, candidates)?
        };
        probe.rollback()?;

        debug!(%report, found = order.len(), "Itemized probe finished");
        Ok(order)
    }

    fn row_order(
        &self,
        doc: &mut dyn Document,
        report: ReportId,
        candidates: &[EntityId],
    ) -> EngineResult<Vec<RowBucket>> {
        let candidates = &Self::eligible(doc, candidates);
        let Some(scratch) = Self::scratch(doc, candidates) else {
            warn!(%report, "No scratch attribute shared by all candidates; report order unavailable");
            return Ok(Vec::new());
        };
        debug!(%report, scratch = %scratch.name, candidates = candidates.len(), "Probing row-merged report");

        let originals: Vec<(EntityId, String)> = candidates
            .iter()
            .map(|id| (*id, Self::scratch_text(doc, *id, &scratch)))
            .collect();

        let mut probe = Batch::transaction(doc, "Find in rows")?;

        let field = {
            let mut step = Batch::sub(&mut *probe)?;
            for id in candidates {
                Self::release(&mut *step, *id);
                if let Err(e) = step.set_attribute(
                    AttributeOwner::Instance(*id),
                    &scratch.name,
                    AttributeValue::text(ROW_SENTINEL),
                ) {
                    warn!(entity = %id, error = %e, "Could not write row sentinel");
                }
            }
            let field = Self::show_field(&mut *step, report, &scratch)?;
            step.regenerate()?;
            step.commit()?;
            field
        };

        let Some((column, rows)) = Self::anchor_rows(&*probe, report)? else {
            probe.rollback()?;
            return Ok(Vec::new());
        };
        let mut buckets: Vec<RowBucket> = (1..=rows.len()).map(RowBucket::new).collect();

        // Only the last successfully cleared entity is blank at any time.
        let mut cleared: Option<EntityId> = None;
        for id in candidates {
            if let Err(e) = Self::clear_sentinel(&mut *probe, &scratch, cleared, *id) {
                warn!(entity = %id, error = %e, "Row probe step failed; entity left unclassified");
                continue;
            }
            cleared = Some(*id);
            match Self::blank_row(&*probe, report, column, &rows) {
                Ok(Some(row_number)) => buckets[row_number - 1].members.push(*id),
                Ok(None) => warn!(entity = %id, "Entity not found on any report row"),
                Err(e) => warn!(entity = %id, error = %e, "Row probe step failed; entity left unclassified"),
            }
        }

        {
            let mut step = Batch::sub(&mut *probe)?;
            for (id, text) in &originals {
                if let Err(e) = step.set_attribute(
                    AttributeOwner::Instance(*id),
                    &scratch.name,
                    AttributeValue::Text(text.clone()),
                ) {
                    warn!(entity = %id, error = %e, "Could not restore scratch value");
                }
            }
            if field == ScratchField::Added {
                step.remove_report_field(report, &scratch.name)?;
            }
            step.commit()?;
        }
        probe.rollback()?;

        debug!(%report, rows = buckets.len(), "Row probe finished");
        Ok(buckets)
    }
}

/// Parses the id that follows [`ID_SEPARATOR`] in a cell.
fn parse_token(token: &str) -> ordermark_types::Result<EntityId> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ordermark_types::Error::InvalidToken(token.to_string()));
    }
    Ok(token.parse::<EntityId>()?)
}
