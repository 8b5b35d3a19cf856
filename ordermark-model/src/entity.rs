use crate::geometry::{Location, Segment};
use crate::schema::{AttributeDef, BuiltinAttribute};
use crate::value::AttributeValue;
use ordermark_types::{ElementTypeId, EntityId, GroupId};
use serde::{Deserialize, Serialize};

/// An attribute slot together with its current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub def: AttributeDef,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(def: AttributeDef, value: impl Into<AttributeValue>) -> Self {
        Self {
            def,
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }
}

/// Whether an attribute was resolved on the instance or on its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeLevel {
    Instance,
    Type,
}

/// A model element placed in the host document.
///
/// The host owns entities. The engine reads them and writes attribute values
/// back through the document; it never creates or destroys one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Category label shown to users ("Walls", "Doors", ...).
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<ElementTypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Extra projected edges (solid outlines) besides the location curve.
    #[serde(default)]
    pub outline: Vec<Segment>,
}

impl Entity {
    /// Creates an ungrouped, untyped entity with no attributes.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            category: category.into(),
            type_id: None,
            group_id: None,
            attributes: Vec::new(),
            location: None,
            outline: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, type_id: ElementTypeId) -> Self {
        self.type_id = Some(type_id);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, def: AttributeDef, value: impl Into<AttributeValue>) -> Self {
        self.attributes.push(Attribute::new(def, value));
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn with_outline(mut self, outline: Vec<Segment>) -> Self {
        self.outline = outline;
        self
    }

    /// Looks up an instance attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.def.name == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.def.name == name)
    }

    /// Looks up a built-in instance attribute.
    pub fn builtin(&self, builtin: BuiltinAttribute) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.def.is_builtin(builtin))
    }

    /// Extract a text value by attribute name.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|a| a.value.as_text())
    }

    /// Extract an integer value by attribute name.
    pub fn get_integer(&self, name: &str) -> Option<i64> {
        self.attribute(name).and_then(|a| a.value.as_integer())
    }

    /// Extract a double value by attribute name.
    pub fn get_double(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(|a| a.value.as_double())
    }

    /// Location edges plus outline edges, used for path intersection.
    pub fn edges(&self) -> Vec<Segment> {
        let mut edges = self
            .location
            .as_ref()
            .map(Location::segments)
            .unwrap_or_default();
        edges.extend(self.outline.iter().copied());
        edges
    }
}

/// A shared element type. Its attributes apply to every instance of the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementType {
    pub id: ElementTypeId,
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl ElementType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ElementTypeId::new(),
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, def: AttributeDef, value: impl Into<AttributeValue>) -> Self {
        self.attributes.push(Attribute::new(def, value));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.def.name == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.def.name == name)
    }

    pub fn builtin(&self, builtin: BuiltinAttribute) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.def.is_builtin(builtin))
    }
}
