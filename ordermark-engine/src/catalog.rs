//! Attributes that can receive marks.

use crate::error::EngineResult;
use ordermark_document::Document;
use ordermark_model::{Attribute, AttributeLevel, BuiltinAttribute, StorageKind};
use ordermark_types::{EntityId, ReportId};
use serde::Serialize;

/// A numberable attribute offered as a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub level: AttributeLevel,
    pub storage: StorageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtin: Option<BuiltinAttribute>,
}

impl CatalogEntry {
    fn from_attribute(attribute: &Attribute, level: AttributeLevel) -> Self {
        Self {
            name: attribute.def.name.clone(),
            level,
            storage: attribute.def.storage,
            builtin: attribute.def.builtin,
        }
    }

    /// Numeric targets ignore prefix and suffix and cannot be cleared.
    pub fn is_numeric(&self) -> bool {
        self.storage != StorageKind::Text
    }
}

/// The target attributes available for a selection or report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeCatalog {
    entries: Vec<CatalogEntry>,
}

impl AttributeCatalog {
    /// Attributes present on every selected entity, instance or type level,
    /// sorted by name.
    pub fn for_selection(doc: &dyn Document, entities: &[EntityId]) -> Self {
        let per_entity: Vec<Vec<(&Attribute, AttributeLevel)>> = entities
            .iter()
            .filter_map(|id| doc.entity(*id))
            .map(|entity| {
                let mut attributes: Vec<(&Attribute, AttributeLevel)> = entity
                    .attributes
                    .iter()
                    .map(|a| (a, AttributeLevel::Instance))
                    .collect();
                if let Some(element_type) = entity.type_id.and_then(|t| doc.element_type(t)) {
                    attributes.extend(
                        element_type
                            .attributes
                            .iter()
                            .map(|a| (a, AttributeLevel::Type)),
                    );
                }
                attributes
            })
            .collect();

        let mut entries: Vec<CatalogEntry> = Vec::new();
        for attributes in &per_entity {
            for (attribute, level) in attributes {
                if !attribute.def.is_numberable() {
                    continue;
                }
                let on_all = per_entity
                    .iter()
                    .all(|other| other.iter().any(|(a, _)| a.name() == attribute.name()));
                let known = entries
                    .iter()
                    .any(|e| e.name == attribute.name() && e.level == *level);
                if on_all && !known {
                    entries.push(CatalogEntry::from_attribute(attribute, *level));
                }
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    /// Attributes of the report's first entity that the report can show.
    /// Type attributes are offered only for row-merged reports.
    pub fn for_report(doc: &dyn Document, report: ReportId) -> EngineResult<Self> {
        let itemized = doc.report_is_itemized(report)?;
        let Some(first) = doc
            .report_entities(report)?
            .first()
            .and_then(|id| doc.entity(*id))
        else {
            return Ok(Self::default());
        };
        let element_type = first.type_id.and_then(|t| doc.element_type(t));

        let mut entries = Vec::new();
        for field in doc.schedulable_fields(report)? {
            let attribute = match field.level {
                AttributeLevel::Instance => first.attribute(&field.name),
                AttributeLevel::Type if !itemized => {
                    element_type.and_then(|t| t.attribute(&field.name))
                }
                AttributeLevel::Type => None,
            };
            if let Some(attribute) = attribute.filter(|a| a.def.is_numberable()) {
                entries.push(CatalogEntry::from_attribute(attribute, field.level));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// The preferred attribute when offered, else the built-in mark, else the
    /// first entry.
    pub fn default_target(&self, preferred: Option<&str>) -> Option<&CatalogEntry> {
        preferred
            .and_then(|name| self.get(name))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.builtin == Some(BuiltinAttribute::Mark))
            })
            .or_else(|| self.entries.first())
    }
}
