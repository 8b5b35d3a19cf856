use crate::config::LocationOrder;
use glam::DVec2;
use ordermark_document::Document;
use ordermark_types::EntityId;
use std::collections::HashSet;
use tracing::debug;

/// Orders entities into rows by placement.
///
/// Points are sorted by Y and split into rows wherever the gap to the
/// previous point reaches `epsilon`. Rows are visited bottom-up or top-down,
/// points inside a row left-to-right or right-to-left. Ties keep input order.
#[derive(Debug, Clone, Copy)]
pub struct SpatialOrderResolver {
    epsilon: f64,
}

impl Default for SpatialOrderResolver {
    fn default() -> Self {
        Self { epsilon: 1e-4 }
    }
}

impl SpatialOrderResolver {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Orders `entities` by their representative points. Entities without a
    /// location are dropped, except under [`LocationOrder::Creation`], which
    /// keeps the input order untouched.
    pub fn order(
        &self,
        doc: &dyn Document,
        entities: &[EntityId],
        policy: LocationOrder,
    ) -> Vec<EntityId> {
        let mut seen = HashSet::new();
        let unique = entities.iter().copied().filter(|id| seen.insert(*id));

        if policy == LocationOrder::Creation {
            return unique.collect();
        }

        let points: Vec<(EntityId, DVec2)> = unique
            .filter_map(|id| {
                let point = doc
                    .entity(id)?
                    .location
                    .as_ref()?
                    .representative_point()?;
                Some((id, point.truncate()))
            })
            .collect();

        if points.len() < seen.len() {
            debug!(
                dropped = seen.len() - points.len(),
                "Entities without a location were left out of spatial order"
            );
        }
        self.order_points(&points, policy)
    }

    /// Orders plan points under `policy`.
    pub fn order_points(&self, points: &[(EntityId, DVec2)], policy: LocationOrder) -> Vec<EntityId> {
        if policy == LocationOrder::Creation {
            return points.iter().map(|(id, _)| *id).collect();
        }

        let mut by_y: Vec<(usize, DVec2)> = points.iter().map(|(_, p)| *p).enumerate().collect();
        by_y.sort_by(|a, b| a.1.y.total_cmp(&b.1.y));

        let mut rows: Vec<Vec<(usize, DVec2)>> = Vec::new();
        let mut last_y = None;
        for entry in by_y {
            match (rows.last_mut(), last_y) {
                (Some(row), Some(y)) if entry.1.y - y < self.epsilon => row.push(entry),
                _ => rows.push(vec![entry]),
            }
            last_y = Some(entry.1.y);
        }

        if policy.is_top_to_bottom() {
            rows.reverse();
        }

        let left_to_right = policy.is_left_to_right();
        rows.into_iter()
            .flat_map(|mut row| {
                row.sort_by(|a, b| {
                    let by_x = if left_to_right {
                        a.1.x.total_cmp(&b.1.x)
                    } else {
                        b.1.x.total_cmp(&a.1.x)
                    };
                    by_x.then(a.0.cmp(&b.0))
                });
                row
            })
            .map(|(index, _)| points[index].0)
            .collect()
    }
}
