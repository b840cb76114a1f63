//! In-memory tables handed to the engine by the bulk table provider.
//!
//! A [`Sheet`] is a named rectangular grid of `serde_json::Value` cells, the
//! same loosely-typed shape a spreadsheet reader produces. Header whitespace is
//! stripped on construction so every later lookup sees canonical names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named table of loosely-typed cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    /// Build a sheet from headers and row-major cells.
    ///
    /// Short rows are padded with `Null` so every row has one cell per column.
    pub fn new(name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.trim().to_string()).collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, Value::Null);
                r
            })
            .collect();
        Self {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    /// Build a sheet from JSON objects, one per row.
    ///
    /// Columns are the union of all keys in first-seen order; non-object
    /// records become empty rows.
    pub fn from_records(name: &str, records: &[Value]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            if let Some(obj) = record.as_object() {
                for key in obj.keys() {
                    let key = key.trim();
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.to_string());
                    }
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                let mut row = vec![Value::Null; columns.len()];
                if let Some(obj) = record.as_object() {
                    for (key, value) in obj {
                        if let Some(idx) = columns.iter().position(|c| c == key.trim()) {
                            row[idx] = value.clone();
                        }
                    }
                }
                row
            })
            .collect();

        Self {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find a column by name: exact match first, then case-insensitive.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Cell rendered as trimmed text; `None` for null or blank cells.
    pub fn text(&self, row: usize, col: usize) -> Option<String> {
        self.cell(row, col).and_then(cell_text)
    }

    /// Cell coerced to a number; `None` when it does not parse.
    pub fn number(&self, row: usize, col: usize) -> Option<f64> {
        self.cell(row, col).and_then(cell_number)
    }

    /// Overwrite a cell, creating the column if needed.
    pub fn set(&mut self, row: usize, column: &str, value: Value) {
        let col = self.ensure_column(column);
        if let Some(r) = self.rows.get_mut(row) {
            if r.len() <= col {
                r.resize(col + 1, Value::Null);
            }
            r[col] = value;
        }
    }

    /// Return the index of `column`, appending an empty column if missing.
    pub fn ensure_column(&mut self, column: &str) -> usize {
        if let Some(idx) = self.column_index(column) {
            return idx;
        }
        self.columns.push(column.to_string());
        let width = self.columns.len();
        // Short rows are padded so the new column lines up with its header.
        for r in self.rows.iter_mut().filter(|r| r.len() < width) {
            r.resize(width, Value::Null);
        }
        width - 1
    }

    /// Keep only the rows at `indices`, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Sheet {
        Sheet {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Render a cell as trimmed text. Null and blank strings yield `None`.
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Coerce a cell to a finite number.
///
/// Strings tolerate surrounding whitespace, thousands separators and a
/// leading currency symbol or trailing percent sign (`"$1,234.50"`, `"12%"`).
pub fn cell_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_number(s)?,
        _ => return None,
    };
    if n.is_finite() {
        Some(n)
    } else {
        None
    }
}

pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.trim().parse::<f64>().ok()
}
