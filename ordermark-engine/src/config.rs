//! Run options and engine configuration.

use crate::error::EngineResult;
use ordermark_model::BuiltinAttribute;
use serde::{Deserialize, Serialize};

/// Whether marks count up or down along the resolved order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

/// How entities picked in a view are ordered by their placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationOrder {
    /// Keep the order the host returned them in.
    #[default]
    Creation,
    LeftToRightTopToBottom,
    LeftToRightBottomToTop,
    RightToLeftTopToBottom,
    RightToLeftBottomToTop,
}

impl LocationOrder {
    pub fn is_left_to_right(self) -> bool {
        matches!(
            self,
            Self::LeftToRightTopToBottom | Self::LeftToRightBottomToTop
        )
    }

    pub fn is_top_to_bottom(self) -> bool {
        matches!(
            self,
            Self::LeftToRightTopToBottom | Self::RightToLeftTopToBottom
        )
    }
}

/// How the entities of an in-view run were selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Window selection. Ordered by [`LocationOrder`], always ascending.
    #[default]
    Rectangle,
    /// One by one. Pick order is the visiting order.
    OrderPick,
    /// Everything a drawn path crosses, in order along the path.
    Path,
}

/// Which resolver derives the visiting order of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOrderStrategy {
    /// Direct query when the host supports it, probing otherwise.
    #[default]
    Auto,
    /// Ask the host for rendered row membership.
    Direct,
    /// Recover the order by writing markers into a scratch attribute.
    Probe,
}

/// What to write and how to count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberingOptions {
    /// Name of the attribute receiving marks.
    pub target: String,
    pub start_value: i64,
    /// Prepended to text marks. Ignored for numeric targets.
    pub prefix: String,
    /// Appended to text marks. Ignored for numeric targets.
    pub suffix: String,
    pub direction: OrderDirection,
}

impl Default for NumberingOptions {
    fn default() -> Self {
        Self {
            target: BuiltinAttribute::Mark.name().to_string(),
            start_value: 1,
            prefix: String::new(),
            suffix: String::new(),
            direction: OrderDirection::Ascending,
        }
    }
}

impl NumberingOptions {
    /// Options targeting `attribute` with every other setting at its default.
    pub fn for_target(attribute: impl Into<String>) -> Self {
        Self {
            target: attribute.into(),
            ..Self::default()
        }
    }
}

/// Options of an in-view run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewNumbering {
    #[serde(flatten)]
    pub options: NumberingOptions,
    pub location_order: LocationOrder,
}

/// Options of an in-report run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportNumbering {
    #[serde(flatten)]
    pub options: NumberingOptions,
    pub strategy: ReportOrderStrategy,
}

/// Engine-wide behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Dissolve and rebuild groups to write attributes that cannot change
    /// inside a group. When off, such writes are reported as errors.
    pub rewrite_groups: bool,
    /// Largest Y gap between points that still share a row.
    pub row_epsilon: f64,
    /// Name of the committed transaction, as shown in the host's undo list.
    pub transaction_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rewrite_groups: true,
            row_epsilon: 1e-4,
            transaction_name: "Order marking".to_string(),
        }
    }
}

impl EngineConfig {
    /// Reads a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
