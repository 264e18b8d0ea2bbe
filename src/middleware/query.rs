//! jq-style query middlewares
//!
//! Queries are compiled once at construction; a bad query is a configuration
//! error, never a per-row one.

use super::types::RowMiddleware;
use crate::error::{Error, Result};
use crate::model::Row;
use crate::query::Query;
use crate::types::{CancelToken, JsonValue};
use std::collections::HashMap;

// ============================================================================
// Object query
// ============================================================================

/// Runs one query over the whole row and emits each output object as a row
///
/// An output that is an array of objects is spread. Any other output is an
/// error. `.items[]` turns a row holding a list into one row per item.
pub struct ObjectQueryMiddleware {
    query: Query,
}

impl ObjectQueryMiddleware {
    /// Compile the query
    pub fn new(query: &str) -> Result<Self> {
        Ok(Self {
            query: Query::compile(query)?,
        })
    }
}

impl RowMiddleware for ObjectQueryMiddleware {
    fn name(&self) -> &'static str {
        "object-query"
    }

    fn process(&mut self, _ctx: &CancelToken, row: Row) -> Result<Vec<Row>> {
        let input = row.into_value();
        let mut out = Vec::new();
        for matched in self.query.run(&input)? {
            match matched {
                JsonValue::Object(map) => out.push(Row::from(map)),
                JsonValue::Array(items) => {
                    for item in items {
                        let JsonValue::Object(map) = item else {
                            return Err(Error::query(
                                self.query.source(),
                                "query result array contains a non-object",
                            ));
                        };
                        out.push(Row::from(map));
                    }
                }
                other => {
                    return Err(Error::query(
                        self.query.source(),
                        format!("query result is not an object: {other}"),
                    ))
                }
            }
        }
        Ok(out)
    }
}

// ============================================================================
// Field queries
// ============================================================================

/// Replaces selected fields with the first output of a per-field query
///
/// The query runs against the field's own value. Later outputs are ignored
/// and no output at all is an error. Fields without a query, or absent from
/// the row, pass through.
pub struct FieldQueryMiddleware {
    queries: HashMap<String, Query>,
}

impl FieldQueryMiddleware {
    /// Compile a map of field name to query
    pub fn new(queries: &HashMap<String, String>) -> Result<Self> {
        let queries = queries
            .iter()
            .map(|(field, q)| Ok((field.clone(), Query::compile(q)?)))
            .collect::<Result<_>>()?;
        Ok(Self { queries })
    }
}

impl RowMiddleware for FieldQueryMiddleware {
    fn name(&self) -> &'static str {
        "field-query"
    }

    fn process(&mut self, _ctx: &CancelToken, mut row: Row) -> Result<Vec<Row>> {
        for (field, query) in &self.queries {
            let Some(value) = row.get(field) else {
                continue;
            };
            let Some(replacement) = query.first(value)? else {
                return Err(Error::query(
                    query.source(),
                    format!("no result for field '{field}'"),
                ));
            };
            row.set(field.clone(), replacement);
        }
        Ok(vec![row])
    }
}
