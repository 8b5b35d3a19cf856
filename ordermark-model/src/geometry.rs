//! Placement geometry of model elements.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A straight edge between two model points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: DVec3,
    pub end: DVec3,
}

impl Segment {
    pub fn new(start: DVec3, end: DVec3) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Point at `t` in `[0, 1]` along the segment.
    pub fn point_at(&self, t: f64) -> DVec3 {
        self.start.lerp(self.end, t)
    }
}

/// Where an element sits in the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Point-based placement (columns, doors, equipment).
    Point(DVec3),
    /// Curve-based placement (walls, beams, pipes), as a polyline.
    Curve(Vec<DVec3>),
}

impl Location {
    /// Shorthand for a straight curve placement.
    pub fn line(start: DVec3, end: DVec3) -> Self {
        Self::Curve(vec![start, end])
    }

    /// Edges of a curve placement. Point placements have none.
    pub fn segments(&self) -> Vec<Segment> {
        match self {
            Self::Point(_) => Vec::new(),
            Self::Curve(points) => points
                .windows(2)
                .map(|pair| Segment::new(pair[0], pair[1]))
                .collect(),
        }
    }

    /// The point used to place the element when ordering spatially: the point
    /// itself, or the middle of the curve by arc length.
    pub fn representative_point(&self) -> Option<DVec3> {
        match self {
            Self::Point(p) => Some(*p),
            Self::Curve(points) => match points.as_slice() {
                [] => None,
                [only] => Some(*only),
                _ => Some(point_at_normalized(&self.segments(), 0.5)),
            },
        }
    }
}

/// Evaluates a polyline at a normalized arc-length parameter.
fn point_at_normalized(segments: &[Segment], t: f64) -> DVec3 {
    let total: f64 = segments.iter().map(Segment::length).sum();
    if total <= f64::EPSILON {
        return segments[0].start;
    }
    let mut remaining = total * t.clamp(0.0, 1.0);
    for segment in segments {
        let len = segment.length();
        if remaining <= len {
            return segment.point_at(if len > 0.0 { remaining / len } else { 0.0 });
        }
        remaining -= len;
    }
    segments[segments.len() - 1].end
}
