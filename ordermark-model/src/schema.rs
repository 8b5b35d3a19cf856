use serde::{Deserialize, Serialize};

/// Describes one attribute slot: its name, how the host stores it, and which
/// mutations the host allows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    pub storage: StorageKind,
    /// The host refuses writes to this attribute.
    #[serde(default)]
    pub read_only: bool,
    /// Members of a group may carry different values for this attribute.
    #[serde(default)]
    pub varies_across_groups: bool,
    /// Set when the attribute has a fixed host meaning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin: Option<BuiltinAttribute>,
    /// Integer storage used as a yes/no flag. Never a numbering target.
    #[serde(default)]
    pub yes_no: bool,
    /// Display unit of a double attribute. Only meaningful when storage is Double.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<DisplayUnit>,
}

impl AttributeDef {
    fn simple(name: &str, storage: StorageKind) -> Self {
        Self {
            name: name.into(),
            storage,
            read_only: false,
            varies_across_groups: false,
            builtin: None,
            yes_no: false,
            unit: None,
        }
    }

    /// Shorthand for a text attribute.
    pub fn text(name: &str) -> Self {
        Self::simple(name, StorageKind::Text)
    }

    /// Shorthand for an integer attribute.
    pub fn integer(name: &str) -> Self {
        Self::simple(name, StorageKind::Integer)
    }

    /// Shorthand for a yes/no attribute (integer storage).
    pub fn yes_no(name: &str) -> Self {
        Self {
            yes_no: true,
            ..Self::simple(name, StorageKind::Integer)
        }
    }

    /// Shorthand for a double attribute displayed in `unit`.
    pub fn double(name: &str, unit: DisplayUnit) -> Self {
        Self {
            unit: Some(unit),
            ..Self::simple(name, StorageKind::Double)
        }
    }

    /// The definition a host uses for a built-in attribute.
    pub fn builtin(builtin: BuiltinAttribute) -> Self {
        Self {
            builtin: Some(builtin),
            ..Self::simple(builtin.name(), StorageKind::Text)
        }
    }

    /// Marks the attribute as read-only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Allows group members to carry different values.
    #[must_use]
    pub fn varying_across_groups(mut self) -> Self {
        self.varies_across_groups = true;
        self
    }

    /// Returns true for integer and double storage.
    pub fn is_numeric(&self) -> bool {
        self.storage != StorageKind::Text
    }

    /// Returns true when the attribute can receive a mark at all.
    pub fn is_numberable(&self) -> bool {
        if self.read_only {
            return false;
        }
        match self.storage {
            StorageKind::Text | StorageKind::Double => true,
            StorageKind::Integer => !self.yes_no,
        }
    }

    /// Returns true when the attribute is the given built-in.
    pub fn is_builtin(&self, builtin: BuiltinAttribute) -> bool {
        self.builtin == Some(builtin)
    }

    /// Whether a grouped instance may have this attribute written in place.
    ///
    /// The built-in mark is always writable inside a group; any other
    /// attribute must be declared as varying across group members.
    pub fn writable_in_group(&self) -> bool {
        self.varies_across_groups || self.is_builtin(BuiltinAttribute::Mark)
    }
}

/// How the host stores an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Text,
    Integer,
    Double,
}

/// Attributes with a fixed meaning in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinAttribute {
    /// The identity mark. Exempt from the group-variance rule.
    Mark,
    /// Free-text instance comments.
    InstanceComments,
    /// Sheet name.
    SheetName,
}

impl BuiltinAttribute {
    /// Display name the host uses for this attribute.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mark => "Mark",
            Self::InstanceComments => "Comments",
            Self::SheetName => "Sheet Name",
        }
    }
}

/// Display unit of a double attribute. The host stores doubles in feet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayUnit {
    Unitless,
    Millimeters,
    Centimeters,
    Meters,
    Inches,
    Feet,
}

impl DisplayUnit {
    /// Feet per one display unit.
    const fn feet_per_unit(self) -> f64 {
        match self {
            Self::Unitless | Self::Feet => 1.0,
            Self::Millimeters => 1.0 / 304.8,
            Self::Centimeters => 1.0 / 30.48,
            Self::Meters => 1.0 / 0.3048,
            Self::Inches => 1.0 / 12.0,
        }
    }

    /// Converts a value typed in this unit into internal storage units.
    pub fn to_internal(self, value: f64) -> f64 {
        value * self.feet_per_unit()
    }

    /// Converts a stored value back into this display unit.
    pub fn from_internal(self, value: f64) -> f64 {
        value / self.feet_per_unit()
    }
}
