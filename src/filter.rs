//! Filter engine: per-row predicates composed into target-ratio groups.
//!
//! Conditions inside a group fold strictly left to right with their own
//! connector, so `[A, AND B, OR C]` is `(A AND B) OR C`. Groups apply in
//! declaration order and the last matching group sets a row's target ratio.
//!
//! # Example
//!
//! ```rust
//! use bid_optimizer::filter::FilterGroupBuilder;
//! use bid_optimizer::models::Operator;
//!
//! let group = FilterGroupBuilder::new(0.25)
//!     .when("Campaign Name", Operator::Contains, "brand")
//!     .and("Clicks", Operator::GreaterThan, "10")
//!     .build();
//! assert_eq!(group.conditions.len(), 2);
//! ```

use serde_json::Value;

use crate::models::{BidRow, Connector, FilterCondition, FilterGroup, Operator};
use crate::sheet::{cell_number, cell_text, parse_number, Sheet};

// ---------------------------------------------------------------------------
// FilterGroupBuilder
// ---------------------------------------------------------------------------

/// Builds a [`FilterGroup`] with explicit connectors.
///
/// Methods return `&mut Self` for chaining. The first condition added is
/// always marked [`Connector::First`].
pub struct FilterGroupBuilder {
    conditions: Vec<FilterCondition>,
    target_ratio: f64,
}

impl FilterGroupBuilder {
    /// Start a group that assigns `target_ratio` to matching rows.
    pub fn new(target_ratio: f64) -> Self {
        Self {
            conditions: Vec::new(),
            target_ratio,
        }
    }

    /// Add the opening condition. Later calls behave like [`and`](Self::and).
    pub fn when(&mut self, column: &str, operator: Operator, value: &str) -> &mut Self {
        self.push(column, operator, value, Connector::And)
    }

    /// Intersect the running result with a condition.
    pub fn and(&mut self, column: &str, operator: Operator, value: &str) -> &mut Self {
        self.push(column, operator, value, Connector::And)
    }

    /// Union the running result with a condition.
    pub fn or(&mut self, column: &str, operator: Operator, value: &str) -> &mut Self {
        self.push(column, operator, value, Connector::Or)
    }

    pub fn build(&self) -> FilterGroup {
        FilterGroup {
            conditions: self.conditions.clone(),
            target_ratio: self.target_ratio,
        }
    }

    fn push(&mut self, column: &str, operator: Operator, value: &str, connector: Connector) -> &mut Self {
        let connector = if self.conditions.is_empty() {
            Connector::First
        } else {
            connector
        };
        self.conditions
            .push(FilterCondition::new(column, operator, value, connector));
        self
    }
}

impl FilterGroup {
    /// Start a [`FilterGroupBuilder`] for a group with this target ratio.
    pub fn builder(target_ratio: f64) -> FilterGroupBuilder {
        FilterGroupBuilder::new(target_ratio)
    }
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Map a logical filter column to the sheet's actual column.
///
/// "Campaign Name" prefers the informational-only campaign name column that
/// bulk exports carry on keyword and target rows.
pub fn resolve_column(sheet: &Sheet, logical: &str) -> Option<usize> {
    if logical.trim().eq_ignore_ascii_case("campaign name") {
        let informational = sheet.columns.iter().position(|c| {
            let lower = c.to_lowercase();
            lower.contains("campaign name") && lower.contains("informational")
        });
        if informational.is_some() {
            return informational;
        }
    }
    sheet.column_index(logical)
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate one condition against one row of `sheet`.
///
/// A column the sheet lacks matches every row. A numeric operator whose
/// literal does not parse matches no row.
pub fn evaluate(sheet: &Sheet, row: usize, condition: &FilterCondition) -> bool {
    let Some(col) = resolve_column(sheet, &condition.column) else {
        return true;
    };
    let cell = sheet.cell(row, col);
    let value = condition.value.as_str();

    match condition.operator {
        Operator::Equals => cell_equals(cell, value),
        Operator::NotEquals => !cell_equals(cell, value),
        Operator::Contains => cell_contains(cell, value),
        Operator::NotContains => !cell_contains(cell, value),
        Operator::GreaterThan => compare(cell, value, |actual, threshold| actual > threshold),
        Operator::LessThan => compare(cell, value, |actual, threshold| actual < threshold),
        Operator::GreaterOrEqual => compare(cell, value, |actual, threshold| actual >= threshold),
        Operator::LessOrEqual => compare(cell, value, |actual, threshold| actual <= threshold),
    }
}

/// Evaluate a group's conditions as a left-associative AND/OR chain.
///
/// An empty group matches every row.
pub fn evaluate_group(sheet: &Sheet, row: usize, group: &FilterGroup) -> bool {
    let mut conditions = group.conditions.iter();
    let Some(first) = conditions.next() else {
        return true;
    };

    let mut result = evaluate(sheet, row, first);
    for condition in conditions {
        match condition.connector {
            Connector::And => result = result && evaluate(sheet, row, condition),
            Connector::Or => result = result || evaluate(sheet, row, condition),
            // A stray opening marker mid-group contributes nothing.
            Connector::First => {}
        }
    }
    result
}

/// Set every row's target ratio from the default and the filter groups.
///
/// Later groups overwrite earlier ones on rows both match.
pub fn assign_target_ratios(
    sheet: &Sheet,
    rows: &mut [BidRow],
    groups: &[FilterGroup],
    default_ratio: f64,
) {
    for row in rows.iter_mut() {
        row.target_ratio = default_ratio;
    }
    for group in groups {
        for row in rows.iter_mut() {
            if evaluate_group(sheet, row.source_index, group) {
                row.target_ratio = group.target_ratio;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Numeric comparison; false when either the literal or the cell does not parse.
fn compare(cell: Option<&Value>, literal: &str, cmp: impl Fn(f64, f64) -> bool) -> bool {
    let Some(threshold) = parse_number(literal).filter(|v| v.is_finite()) else {
        return false;
    };
    match cell.and_then(cell_number) {
        Some(actual) => cmp(actual, threshold),
        None => false,
    }
}

fn cell_equals(cell: Option<&Value>, value: &str) -> bool {
    let Some(text) = cell.and_then(cell_text) else {
        return false;
    };
    let value = value.trim();
    if text == value {
        return true;
    }
    // Numeric cells compare by value so "5" equals a cell holding 5.0.
    match (parse_number(&text), parse_number(value)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn cell_contains(cell: Option<&Value>, value: &str) -> bool {
    match cell.and_then(cell_text) {
        Some(text) => text.to_lowercase().contains(&value.to_lowercase()),
        None => false,
    }
}
