//! Report definitions and rendering for the in-memory host.

use crate::document::ReportField;
use ordermark_model::{ElementType, Entity};
use ordermark_types::{EntityId, ReportId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A tabular report over the entities of some categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub name: String,
    /// One row per entity. When false, entities with equal sort values share a row.
    pub itemized: bool,
    /// Categories shown. Empty means every entity.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub fields: Vec<ReportField>,
    #[serde(default)]
    pub sort_by: Vec<SortKey>,
}

/// One sort level of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub attribute: String,
    #[serde(default)]
    pub descending: bool,
}

impl Report {
    /// Creates an itemized report over every entity, with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ReportId::new(),
            name: name.into(),
            itemized: true,
            categories: Vec::new(),
            fields: Vec::new(),
            sort_by: Vec::new(),
        }
    }

    /// Combines entities with equal sort values into one row.
    #[must_use]
    pub fn row_merged(mut self) -> Self {
        self.itemized = false;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, attribute: impl Into<String>) -> Self {
        self.fields.push(ReportField::new(attribute));
        self
    }

    #[must_use]
    pub fn with_hidden_field(mut self, attribute: impl Into<String>) -> Self {
        self.fields.push(ReportField {
            attribute: attribute.into(),
            hidden: true,
        });
        self
    }

    #[must_use]
    pub fn sorted_by(mut self, attribute: impl Into<String>) -> Self {
        self.sort_by.push(SortKey {
            attribute: attribute.into(),
            descending: false,
        });
        self
    }

    #[must_use]
    pub fn sorted_by_descending(mut self, attribute: impl Into<String>) -> Self {
        self.sort_by.push(SortKey {
            attribute: attribute.into(),
            descending: true,
        });
        self
    }

    pub(crate) fn shows(&self, entity: &Entity) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| *c == entity.category)
    }

    pub(crate) fn field_index(&self, attribute: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.attribute == attribute)
    }
}

/// A rendered report body. Row 0 is the header row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RenderedRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderedRow {
    pub members: Vec<EntityId>,
    pub cells: Vec<String>,
}

impl RenderedTable {
    /// Number of body rows, header included.
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        if row == 0 {
            return self.headers.get(column).map(String::as_str);
        }
        self.rows
            .get(row - 1)
            .and_then(|r| r.cells.get(column))
            .map(String::as_str)
    }
}

/// Renders `report` over `entities` in document order.
pub(crate) fn render(report: &Report, entities: &[Entity], types: &[ElementType]) -> RenderedTable {
    let columns: Vec<&ReportField> = report.fields.iter().filter(|f| !f.hidden).collect();

    let mut keyed: Vec<(Vec<String>, &Entity)> = entities
        .iter()
        .filter(|e| report.shows(e))
        .map(|e| {
            let key = report
                .sort_by
                .iter()
                .map(|s| cell_value(e, types, &s.attribute))
                .collect();
            (key, e)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, &report.sort_by));

    let mut groups: Vec<(Vec<String>, Vec<&Entity>)> = Vec::new();
    for (key, entity) in keyed {
        match groups.last_mut() {
            Some((last_key, members)) if !report.itemized && *last_key == key => {
                members.push(entity);
            }
            _ => groups.push((key, vec![entity])),
        }
    }

    let rows = groups
        .into_iter()
        .map(|(_, members)| {
            let cells = columns
                .iter()
                .map(|field| merged_cell(&members, types, &field.attribute))
                .collect();
            RenderedRow {
                members: members.iter().map(|e| e.id).collect(),
                cells,
            }
        })
        .collect();

    RenderedTable {
        headers: columns.iter().map(|f| f.attribute.clone()).collect(),
        rows,
    }
}

/// Text of an attribute on the entity, falling back to its type.
pub(crate) fn cell_value(entity: &Entity, types: &[ElementType], attribute: &str) -> String {
    if let Some(a) = entity.attribute(attribute) {
        return a.value.display_text(a.def.unit);
    }
    entity
        .type_id
        .and_then(|tid| types.iter().find(|t| t.id == tid))
        .and_then(|t| t.attribute(attribute))
        .map(|a| a.value.display_text(a.def.unit))
        .unwrap_or_default()
}

/// A merged row shows a value only when every member agrees on it.
fn merged_cell(members: &[&Entity], types: &[ElementType], attribute: &str) -> String {
    let mut values = members.iter().map(|e| cell_value(e, types, attribute));
    let Some(first) = values.next() else {
        return String::new();
    };
    if values.all(|v| v == first) {
        first
    } else {
        String::new()
    }
}

fn compare_keys(a: &[String], b: &[String], sort_by: &[SortKey]) -> Ordering {
    for ((x, y), key) in a.iter().zip(b).zip(sort_by) {
        let ord = compare_cells(x, y);
        let ord = if key.descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Numbers compare numerically, everything else as text.
fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}
