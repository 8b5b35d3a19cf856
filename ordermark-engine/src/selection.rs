use crate::config::SelectionMode;
use glam::DVec3;
use ordermark_types::EntityId;

/// Entities picked in a view, and how they were picked.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub mode: SelectionMode,
    pub entities: Vec<EntityId>,
    /// Drawn path for [`SelectionMode::Path`], as a polyline.
    pub path: Vec<DVec3>,
    /// Direction the view looks in. Paths and edges are projected along it.
    pub view_direction: DVec3,
}

impl Selection {
    fn with_mode(mode: SelectionMode, entities: Vec<EntityId>) -> Self {
        Self {
            mode,
            entities,
            path: Vec::new(),
            view_direction: DVec3::NEG_Z,
        }
    }

    /// A window selection, in the order the host returned the entities.
    pub fn rectangle(entities: Vec<EntityId>) -> Self {
        Self::with_mode(SelectionMode::Rectangle, entities)
    }

    /// Entities picked one by one, in pick order.
    pub fn picked(entities: Vec<EntityId>) -> Self {
        Self::with_mode(SelectionMode::OrderPick, entities)
    }

    /// Entities visible in the view, ordered along `path`.
    pub fn along_path(entities: Vec<EntityId>, path: Vec<DVec3>) -> Self {
        Self {
            path,
            ..Self::with_mode(SelectionMode::Path, entities)
        }
    }

    #[must_use]
    pub fn with_view_direction(mut self, direction: DVec3) -> Self {
        self.view_direction = direction;
        self
    }
}
