use crate::schema::{DisplayUnit, StorageKind};
use serde::{Deserialize, Serialize};

/// A value held in an attribute slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// No value has been assigned.
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    /// Stored in internal units (feet).
    Double(f64),
}

impl AttributeValue {
    /// Shorthand for a text value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content, if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the double content, if this is a double value.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Whether this value may be stored in a slot of the given kind.
    /// `Empty` fits every kind.
    pub fn fits(&self, storage: StorageKind) -> bool {
        matches!(
            (self, storage),
            (Self::Empty, _)
                | (Self::Text(_), StorageKind::Text)
                | (Self::Integer(_), StorageKind::Integer)
                | (Self::Double(_), StorageKind::Double)
        )
    }

    /// Text as a report cell shows it. Doubles are shown in `unit`.
    pub fn display_text(&self, unit: Option<DisplayUnit>) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Integer(v) => v.to_string(),
            Self::Double(v) => {
                let shown = unit.map_or(*v, |u| u.from_internal(*v));
                // Trim float noise introduced by unit conversion.
                let rounded = (shown * 1e6).round() / 1e6;
                format!("{rounded}")
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}
