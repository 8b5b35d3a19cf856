use glam::{DVec2, DVec3};
use ordermark_document::Document;
use ordermark_model::Segment;
use ordermark_types::EntityId;
use std::collections::HashSet;
use tracing::debug;

const PARAM_TOLERANCE: f64 = 1e-9;

/// Orders entities by where a drawn path first crosses them.
///
/// The path and every entity edge (location curve plus outline) are
/// projected onto the plane perpendicular to the view direction. An entity's
/// key is the smallest normalized arc-length parameter at which the path
/// meets one of its edges. Entities the path never meets are dropped.
#[derive(Debug, Clone, Copy)]
pub struct PathOrderResolver {
    u: DVec3,
    v: DVec3,
}

impl Default for PathOrderResolver {
    fn default() -> Self {
        Self::new(DVec3::NEG_Z)
    }
}

impl PathOrderResolver {
    /// Projects along `view_direction`. A zero direction means a plan view.
    pub fn new(view_direction: DVec3) -> Self {
        let normal = view_direction.try_normalize().unwrap_or(DVec3::NEG_Z);
        let (u, v) = normal.any_orthonormal_pair();
        Self { u, v }
    }

    fn project(&self, point: DVec3) -> DVec2 {
        DVec2::new(point.dot(self.u), point.dot(self.v))
    }

    pub fn order(&self, doc: &dyn Document, entities: &[EntityId], path: &[DVec3]) -> Vec<EntityId> {
        let path: Vec<DVec2> = path.iter().map(|p| self.project(*p)).collect();
        let lengths: Vec<f64> = path.windows(2).map(|w| w[0].distance(w[1])).collect();
        let total: f64 = lengths.iter().sum();
        if total <= f64::EPSILON {
            debug!("Path has no length; nothing to order");
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut keyed: Vec<(f64, EntityId)> = entities
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| {
                let edges = doc.entity(id)?.edges();
                let key = self.first_crossing(&path, &lengths, total, &edges)?;
                Some((key, id))
            })
            .collect();

        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        debug!(crossed = keyed.len(), candidates = entities.len(), "Ordered entities along path");
        keyed.into_iter().map(|(_, id)| id).collect()
    }

    fn first_crossing(
        &self,
        path: &[DVec2],
        lengths: &[f64],
        total: f64,
        edges: &[Segment],
    ) -> Option<f64> {
        let edges: Vec<(DVec2, DVec2)> = edges
            .iter()
            .map(|e| (self.project(e.start), self.project(e.end)))
            .collect();

        let mut travelled = 0.0;
        let mut best: Option<f64> = None;
        for (i, window) in path.windows(2).enumerate() {
            for (start, end) in &edges {
                if let Some(t) = intersect(window[0], window[1], *start, *end) {
                    let param = (travelled + t * lengths[i]) / total;
                    best = Some(best.map_or(param, |b| b.min(param)));
                }
            }
            travelled += lengths[i];
        }
        best
    }
}

/// Parameter along `p0 -> p1` where it crosses `q0 -> q1`. Parallel segments
/// never cross.
fn intersect(p0: DVec2, p1: DVec2, q0: DVec2, q1: DVec2) -> Option<f64> {
    let r = p1 - p0;
    let s = q1 - q0;
    let denom = r.perp_dot(s);
    if denom.abs() <= f64::EPSILON {
        return None;
    }
    let qp = q0 - p0;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    let within = |x: f64| (-PARAM_TOLERANCE..=1.0 + PARAM_TOLERANCE).contains(&x);
    (within(t) && within(u)).then(|| t.clamp(0.0, 1.0))
}
