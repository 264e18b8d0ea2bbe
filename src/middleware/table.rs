//! Table-level middlewares: row sort and column order

use super::types::TableMiddleware;
use crate::error::Result;
use crate::model::Table;
use crate::types::{CancelToken, JsonValue};
use std::cmp::Ordering;

// ============================================================================
// Sort by
// ============================================================================

/// One sort key: a column and its direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    /// Parse `name` or `-name` (descending)
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        match spec.strip_prefix('-') {
            Some(column) => Self {
                column: column.to_string(),
                descending: true,
            },
            None => Self {
                column: spec.to_string(),
                descending: false,
            },
        }
    }
}

/// Stable sort of the table's rows by a list of column specs
///
/// Numbers compare as floats, strings lexicographically, anything else
/// (including absent values) compares equal and falls through to the next key.
#[derive(Debug, Clone, Default)]
pub struct SortByMiddleware {
    keys: Vec<SortKey>,
}

impl SortByMiddleware {
    /// Create from specs such as `["-a", "b"]`
    pub fn new<S: AsRef<str>>(specs: &[S]) -> Self {
        Self {
            keys: specs
                .iter()
                .map(|s| s.as_ref())
                .filter(|s| !s.trim().is_empty())
                .map(SortKey::parse)
                .collect(),
        }
    }

    /// The parsed keys
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }
}

/// Compare two cells: numeric, then string, else equal
pub fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            }
        }
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

impl TableMiddleware for SortByMiddleware {
    fn name(&self) -> &'static str {
        "sort-by"
    }

    fn process(&mut self, _ctx: &CancelToken, mut table: Table) -> Result<Table> {
        if self.keys.is_empty() {
            return Ok(table);
        }
        table.rows_mut().sort_by(|a, b| {
            for key in &self.keys {
                let ord = compare_values(a.get(&key.column), b.get(&key.column));
                let ord = if key.descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        Ok(table)
    }
}

// ============================================================================
// Column order
// ============================================================================

/// Forces the given columns to the front of the table's column list
#[derive(Debug, Clone, Default)]
pub struct ColumnOrderMiddleware {
    order: Vec<String>,
}

impl ColumnOrderMiddleware {
    pub fn new<S: Into<String>>(order: impl IntoIterator<Item = S>) -> Self {
        Self {
            order: order.into_iter().map(Into::into).collect(),
        }
    }
}

impl TableMiddleware for ColumnOrderMiddleware {
    fn name(&self) -> &'static str {
        "column-order"
    }

    fn process(&mut self, _ctx: &CancelToken, mut table: Table) -> Result<Table> {
        table.set_column_order(&self.order);
        Ok(table)
    }
}
