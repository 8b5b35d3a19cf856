//! Mark sequence generation.
//!
//! Pure functions from a visiting order to `(entity, value)` pairs. Both
//! directions cover the same value range: ascending gives `start + i`,
//! descending gives `count + start - i - 1`.

use crate::config::OrderDirection;
use crate::error::{EngineError, EngineResult};
use crate::resolve::RowBucket;
use ordermark_types::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The value one entity receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkAssignment {
    pub entity: EntityId,
    pub value: i64,
}

/// Value at position `index` of `count`, or `None` when it leaves the `i64` range.
pub fn value_at(index: usize, count: usize, start: i64, direction: OrderDirection) -> Option<i64> {
    let offset = match direction {
        OrderDirection::Ascending => index,
        OrderDirection::Descending => count.checked_sub(index)?.checked_sub(1)?,
    };
    start.checked_add(i64::try_from(offset).ok()?)
}

fn checked_value(
    index: usize,
    count: usize,
    start: i64,
    direction: OrderDirection,
) -> EngineResult<i64> {
    value_at(index, count, start, direction).ok_or(EngineError::SequenceOverflow { start, count })
}

/// Numbers entities in visiting order. Repeated entities keep their first position.
///
/// Fails with [`EngineError::SequenceOverflow`] when the range would leave `i64`.
pub fn generate(
    order: &[EntityId],
    start: i64,
    direction: OrderDirection,
) -> EngineResult<Vec<MarkAssignment>> {
    let mut seen = HashSet::with_capacity(order.len());
    let unique: Vec<EntityId> = order.iter().copied().filter(|id| seen.insert(*id)).collect();
    let count = unique.len();

    unique
        .into_iter()
        .enumerate()
        .map(|(i, entity)| {
            Ok(MarkAssignment {
                entity,
                value: checked_value(i, count, start, direction)?,
            })
        })
        .collect()
}

/// Numbers report rows: every member of a row gets the row's value.
///
/// Empty buckets are skipped and do not consume a value. An entity listed in
/// several buckets keeps the first.
pub fn generate_for_rows(
    buckets: &[RowBucket],
    start: i64,
    direction: OrderDirection,
) -> EngineResult<Vec<MarkAssignment>> {
    let rows: Vec<&RowBucket> = buckets.iter().filter(|b| !b.members.is_empty()).collect();
    let count = rows.len();
    let mut seen = HashSet::new();
    let mut assignments = Vec::new();

    for (i, bucket) in rows.into_iter().enumerate() {
        let value = checked_value(i, count, start, direction)?;
        for entity in &bucket.members {
            if seen.insert(*entity) {
                assignments.push(MarkAssignment {
                    entity: *entity,
                    value,
                });
            }
        }
    }
    Ok(assignments)
}
