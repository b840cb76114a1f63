use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Operator — Comparison applied by a single filter condition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "doesn't equal", alias = "not equals")]
    NotEquals,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "doesn't contain", alias = "not contains")]
    NotContains,
    #[serde(rename = "greater than")]
    GreaterThan,
    #[serde(rename = "less than")]
    LessThan,
    #[serde(rename = "greater than or equal to")]
    GreaterOrEqual,
    #[serde(rename = "less than or equal to")]
    LessOrEqual,
}

// ---------------------------------------------------------------------------
// Connector — How a condition folds into the running group result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    /// First condition of a group; no connector applies.
    #[default]
    First,
    And,
    Or,
}

// ---------------------------------------------------------------------------
// FilterCondition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    #[serde(rename = "type")]
    pub operator: Operator,
    pub value: String,
    #[serde(rename = "logic", default)]
    pub connector: Connector,
}

impl FilterCondition {
    pub fn new(column: &str, operator: Operator, value: &str, connector: Connector) -> Self {
        Self {
            column: column.to_string(),
            operator,
            value: value.to_string(),
            connector,
        }
    }
}

// ---------------------------------------------------------------------------
// FilterGroup — Ordered conditions paired with a target ratio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub conditions: Vec<FilterCondition>,
    /// Target ACoS for matching rows, as a fraction.
    pub target_ratio: f64,
}
