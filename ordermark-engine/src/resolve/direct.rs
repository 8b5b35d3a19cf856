use super::{ReportOrderResolver, RowBucket};
use crate::error::{EngineError, EngineResult};
use ordermark_document::Document;
use ordermark_types::{EntityId, ReportId};
use std::collections::HashSet;
use tracing::debug;

/// Reads row membership straight from the host's rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectQueryOrderResolver;

impl DirectQueryOrderResolver {
    fn rows(doc: &dyn Document, report: ReportId) -> EngineResult<Vec<Vec<EntityId>>> {
        doc.rendered_rows(report).ok_or_else(|| {
            EngineError::ReportOrder("host does not expose rendered rows".to_string())
        })
    }
}

impl ReportOrderResolver for DirectQueryOrderResolver {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn itemized_order(
        &self,
        doc: &mut dyn Document,
        report: ReportId,
        candidates: &[EntityId],
    ) -> EngineResult<Vec<EntityId>> {
        let rows = Self::rows(doc, report)?;
        let mut seen = HashSet::new();
        let order: Vec<EntityId> = rows
            .into_iter()
            .flatten()
            .filter(|id| candidates.contains(id) && seen.insert(*id))
            .collect();
        debug!(%report, found = order.len(), "Queried itemized order");
        Ok(order)
    }

    fn row_order(
        &self,
        doc: &mut dyn Document,
        report: ReportId,
        candidates: &[EntityId],
    ) -> EngineResult<Vec<RowBucket>> {
        let rows = Self::rows(doc, report)?;
        let mut seen = HashSet::new();
        let mut buckets = Vec::new();
        for members in rows {
            let members: Vec<EntityId> = members
                .into_iter()
                .filter(|id| candidates.contains(id) && seen.insert(*id))
                .collect();
            if !members.is_empty() {
                buckets.push(RowBucket {
                    row_number: buckets.len() + 1,
                    members,
                });
            }
        }
        debug!(%report, rows = buckets.len(), "Queried row order");
        Ok(buckets)
    }
}
