//! Numbering runs.
//!
//! [`NumberingService`] ties resolution and assignment together. Every run
//! resolves its visiting order first (inside rolled-back batches) and only
//! then writes, with duplicate-value failures suppressed for the duration of
//! the write.

use crate::config::{
    EngineConfig, NumberingOptions, OrderDirection, ReportNumbering,
    SelectionMode, ViewNumbering,
};
use crate::error::{EngineError, EngineResult};
use crate::group_rewrite::GroupRewriteCoordinator;
use crate::resolve::{self, PathOrderResolver, SpatialOrderResolver};
use crate::selection::Selection;
use crate::sequence::{self, MarkAssignment};
use crate::suppressor::ConflictSuppressor;
use crate::writer::{resolve_target, MarkWriter, WriteOutcome, WriteReport};
use ordermark_document::{AttributeOwner, Batch, Document};
use ordermark_model::{AttributeValue, StorageKind};
use ordermark_types::{EntityId, ReportId};
use tracing::{debug, info, warn};

/// Runs numbering and clearing against a document.
#[derive(Debug, Clone, Default)]
pub struct NumberingService {
    config: EngineConfig,
}

impl NumberingService {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Numbers the entities of a report in the order it shows them.
    ///
    /// Itemized reports give every entity its own value and only write
    /// instance attributes. Row-merged reports give every entity on a row
    /// the row's value and may write type attributes.
    pub fn number_in_report(
        &self,
        doc: &mut dyn Document,
        report: ReportId,
        numbering: &ReportNumbering,
    ) -> EngineResult<WriteReport> {
        let options = &numbering.options;
        check_target(options)?;

        let itemized = doc.report_is_itemized(report)?;
        let allow_type_level = !itemized;
        let candidates: Vec<EntityId> = doc
            .report_entities(report)?
            .into_iter()
            .filter(|id| resolve_target(&*doc, *id, &options.target, allow_type_level).is_some())
            .collect();
        if candidates.is_empty() {
            info!(%report, target = %options.target, "No report entity exposes the target");
            return Ok(WriteReport::new(&options.target));
        }

        let resolver = resolve::report_resolver(numbering.strategy, &*doc, report);
        debug!(%report, itemized, resolver = resolver.name(), candidates = candidates.len(), "Resolving report order");

        let assignments = if itemized {
            let order = resolver.itemized_order(doc, report, &candidates)?;
            sequence::generate(&order, options.start_value, options.direction)?
        } else {
            let rows = resolver.row_order(doc, report, &candidates)?;
            sequence::generate_for_rows(&rows, options.start_value, options.direction)?
        };

        self.apply(doc, &assignments, options, allow_type_level)
    }

    /// Numbers entities picked in a view.
    ///
    /// Window selections are ordered by placement and always count up.
    /// Picked and path selections count in the configured direction.
    pub fn number_in_view(
        &self,
        doc: &mut dyn Document,
        selection: &Selection,
        numbering: &ViewNumbering,
    ) -> EngineResult<WriteReport> {
        let options = &numbering.options;
        check_target(options)?;

        let candidates: Vec<EntityId> = selection
            .entities
            .iter()
            .copied()
            .filter(|id| resolve_target(&*doc, *id, &options.target, true).is_some())
            .collect();

        let (order, direction) = match selection.mode {
            SelectionMode::Rectangle => {
                let order = SpatialOrderResolver::new(self.config.row_epsilon).order(
                    &*doc,
                    &candidates,
                    numbering.location_order,
                );
                (order, OrderDirection::Ascending)
            }
            SelectionMode::OrderPick => (candidates, options.direction),
            SelectionMode::Path => {
                let order = PathOrderResolver::new(selection.view_direction).order(
                    &*doc,
                    &candidates,
                    &selection.path,
                );
                (order, options.direction)
            }
        };
        debug!(mode = ?selection.mode, ordered = order.len(), "Resolved view order");

        let assignments = sequence::generate(&order, options.start_value, direction)?;
        self.apply(doc, &assignments, options, true)
    }

    /// Empties a text target on every report entity that has it.
    pub fn clear_in_report(
        &self,
        doc: &mut dyn Document,
        report: ReportId,
        target: &str,
    ) -> EngineResult<WriteReport> {
        let entities = doc.report_entities(report)?;
        self.clear(doc, &entities, target)
    }

    /// Empties a text target on the selected entities.
    pub fn clear_in_view(
        &self,
        doc: &mut dyn Document,
        entities: &[EntityId],
        target: &str,
    ) -> EngineResult<WriteReport> {
        self.clear(doc, entities, target)
    }

    fn clear(
        &self,
        doc: &mut dyn Document,
        entities: &[EntityId],
        target: &str,
    ) -> EngineResult<WriteReport> {
        let mut report = WriteReport::new(target);
        let texts: Vec<EntityId> = entities
            .iter()
            .copied()
            .filter(|id| {
                doc.attribute(AttributeOwner::Instance(*id), target)
                    .is_some_and(|a| a.def.storage == StorageKind::Text)
            })
            .collect();
        if texts.is_empty() {
            debug!(target, "Nothing to clear");
            return Ok(report);
        }

        let mut tx = Batch::transaction(doc, &self.config.transaction_name)?;
        for id in texts {
            let outcome = match tx.set_attribute(
                AttributeOwner::Instance(id),
                target,
                AttributeValue::text(""),
            ) {
                Ok(()) => WriteOutcome::Updated,
                Err(e) => {
                    warn!(entity = %id, error = %e, "Could not clear attribute");
                    WriteOutcome::Error(e.to_string())
                }
            };
            report.record(id, outcome);
        }
        tx.commit()?;

        info!(target, cleared = report.updated().len(), "Cleared attribute");
        Ok(report)
    }

    fn apply(
        &self,
        doc: &mut dyn Document,
        assignments: &[MarkAssignment],
        options: &NumberingOptions,
        allow_type_level: bool,
    ) -> EngineResult<WriteReport> {
        if assignments.is_empty() {
            info!(target = %options.target, "Resolved order is empty; nothing to number");
            return Ok(WriteReport::new(&options.target));
        }

        let mut doc = ConflictSuppressor::install(doc);
        let pass = MarkWriter::new(options)
            .allow_type_level(allow_type_level)
            .rewrite_groups(self.config.rewrite_groups)
            .write(&mut *doc, assignments, &self.config.transaction_name)?;

        let mut report = pass.report;
        GroupRewriteCoordinator::new(&self.config.transaction_name).rewrite(
            &mut *doc,
            pass.deferred,
            &mut report,
        )?;

        info!(
            target = %options.target,
            assigned = assignments.len(),
            updated = report.updated().len(),
            dismissed = doc.dismissed(),
            "Numbering finished"
        );
        Ok(report)
    }
}

fn check_target(options: &NumberingOptions) -> EngineResult<()> {
    if options.target.trim().is_empty() {
        return Err(EngineError::NoTarget);
    }
    Ok(())
}
