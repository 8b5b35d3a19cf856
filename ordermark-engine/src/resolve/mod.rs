//! Visiting-order resolution.
//!
//! - [`ReportOrderResolver`] recovers the order a report shows its entities
//!   in, either by asking the host ([`DirectQueryOrderResolver`]) or by
//!   probing rendered cells ([`ProbeOrderResolver`])
//! - [`SpatialOrderResolver`] orders picked entities by placement
//! - [`PathOrderResolver`] orders entities along a drawn path
//!
//! Every resolver returns unique entities drawn from its candidates.

mod direct;
mod path;
mod probe;
mod spatial;

pub use direct::DirectQueryOrderResolver;
pub use path::PathOrderResolver;
pub use probe::{ProbeOrderResolver, ID_SEPARATOR, ROW_SENTINEL, SCRATCH_PREFERENCE};
pub use spatial::SpatialOrderResolver;

use crate::config::ReportOrderStrategy;
use crate::error::EngineResult;
use ordermark_document::Document;
use ordermark_types::{EntityId, ReportId};
use serde::{Deserialize, Serialize};

/// Entities shown on one row of a row-merged report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowBucket {
    /// 1-based position among the rows that hold candidates.
    pub row_number: usize,
    pub members: Vec<EntityId>,
}

impl RowBucket {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            members: Vec::new(),
        }
    }
}

/// Recovers the visiting order of a report.
///
/// Implementations may open and roll back batches on the document but leave
/// no change behind.
pub trait ReportOrderResolver {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Candidates in the order an itemized report shows them.
    fn itemized_order(
        &self,
        doc: &mut dyn Document,
        report: ReportId,
        candidates: &[EntityId],
    ) -> EngineResult<Vec<EntityId>>;

    /// Candidates bucketed by the row of a row-merged report that shows them.
    fn row_order(
        &self,
        doc: &mut dyn Document,
        report: ReportId,
        candidates: &[EntityId],
    ) -> EngineResult<Vec<RowBucket>>;
}

/// Picks the resolver for `strategy`.
pub fn report_resolver(
    strategy: ReportOrderStrategy,
    doc: &dyn Document,
    report: ReportId,
) -> Box<dyn ReportOrderResolver> {
    match strategy {
        ReportOrderStrategy::Direct => Box::new(DirectQueryOrderResolver),
        ReportOrderStrategy::Probe => Box::new(ProbeOrderResolver),
        ReportOrderStrategy::Auto => {
            if doc.rendered_rows(report).is_some() {
                Box::new(DirectQueryOrderResolver)
            } else {
                Box::new(ProbeOrderResolver)
            }
        }
    }
}
