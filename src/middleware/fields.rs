//! Field-shaping row middlewares
//!
//! Flatten, fields/filters selection, reorder, sort columns, remove nulls
//! and constant fields.

use super::types::RowMiddleware;
use crate::error::{Error, Result};
use crate::model::Row;
use crate::types::{CancelToken, JsonValue};
use regex::Regex;
use std::collections::{HashMap, HashSet};

// ============================================================================
// Flatten
// ============================================================================

/// Replaces nested records with their leaves, joining keys with `.`
///
/// Sequences are not descended.
#[derive(Debug, Clone, Default)]
pub struct FlattenMiddleware {
    separator: String,
}

impl FlattenMiddleware {
    /// Create a flatten middleware using `.` as the path separator
    pub fn new() -> Self {
        Self {
            separator: ".".to_string(),
        }
    }

    /// Use a different path separator
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    fn flatten_into(&self, out: &mut Row, prefix: Option<&str>, key: String, value: JsonValue) {
        let path = match prefix {
            Some(p) => format!("{p}{}{key}", self.separator),
            None => key,
        };
        match value {
            JsonValue::Object(map) => {
                for (k, v) in map {
                    self.flatten_into(out, Some(&path), k, v);
                }
            }
            other => out.set(path, other),
        }
    }
}

impl RowMiddleware for FlattenMiddleware {
    fn name(&self) -> &'static str {
        "flatten"
    }

    fn process(&mut self, _ctx: &CancelToken, row: Row) -> Result<Vec<Row>> {
        if !row.iter().any(|(_, v)| v.is_object()) {
            return Ok(vec![row]);
        }
        let mut out = Row::with_capacity(row.len());
        for (key, value) in row {
            self.flatten_into(&mut out, None, key, value);
        }
        Ok(vec![out])
    }
}

// ============================================================================
// Fields / Filters
// ============================================================================

/// Keeps and drops fields by exact name, `.`-suffixed prefix or regex
///
/// Per field, first match wins:
/// exact keep; prefix keep unless exact drop; regex keep unless exact drop;
/// any drop; pass through when no keep rule exists; otherwise drop.
/// Decisions are memoized per field name.
#[derive(Debug, Clone, Default)]
pub struct FieldsFilterMiddleware {
    fields: HashSet<String>,
    prefix_fields: Vec<String>,
    regex_fields: Vec<Regex>,
    filters: HashSet<String>,
    prefix_filters: Vec<String>,
    regex_filters: Vec<Regex>,
    decisions: HashMap<String, bool>,
}

impl FieldsFilterMiddleware {
    /// Create a filter from keep and drop lists (entries ending in `.` are prefixes)
    pub fn new<S: AsRef<str>>(fields: &[S], filters: &[S]) -> Self {
        let mut mw = Self::default();
        for field in fields {
            let field = field.as_ref();
            if field.ends_with('.') {
                mw.prefix_fields.push(field.to_string());
            } else if !field.is_empty() {
                mw.fields.insert(field.to_string());
            }
        }
        for filter in filters {
            let filter = filter.as_ref();
            if filter.ends_with('.') {
                mw.prefix_filters.push(filter.to_string());
            } else if !filter.is_empty() {
                mw.filters.insert(filter.to_string());
            }
        }
        mw
    }

    /// Add regex keep patterns
    pub fn with_regex_fields<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        self.regex_fields = compile_all(patterns)?;
        Ok(self)
    }

    /// Add regex drop patterns
    pub fn with_regex_filters<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        self.regex_filters = compile_all(patterns)?;
        Ok(self)
    }

    fn has_keep_rules(&self) -> bool {
        !self.fields.is_empty() || !self.prefix_fields.is_empty() || !self.regex_fields.is_empty()
    }

    fn has_drop_rules(&self) -> bool {
        !self.filters.is_empty() || !self.prefix_filters.is_empty() || !self.regex_filters.is_empty()
    }

    /// Whether `field` is kept
    pub fn includes(&mut self, field: &str) -> bool {
        if let Some(&keep) = self.decisions.get(field) {
            return keep;
        }
        let keep = self.decide(field);
        self.decisions.insert(field.to_string(), keep);
        keep
    }

    fn decide(&self, field: &str) -> bool {
        let exact_keep = self.fields.contains(field);
        let prefix_keep = self.prefix_fields.iter().any(|p| field.starts_with(p.as_str()));
        let regex_keep = self.regex_fields.iter().any(|r| r.is_match(field));
        let exact_drop = self.filters.contains(field);
        let prefix_drop = self.prefix_filters.iter().any(|p| field.starts_with(p.as_str()));
        let regex_drop = self.regex_filters.iter().any(|r| r.is_match(field));

        if exact_keep {
            true
        } else if prefix_keep || regex_keep {
            !exact_drop
        } else if exact_drop || prefix_drop || regex_drop {
            false
        } else {
            !self.has_keep_rules()
        }
    }
}

impl RowMiddleware for FieldsFilterMiddleware {
    fn name(&self) -> &'static str {
        "fields-filter"
    }

    fn process(&mut self, _ctx: &CancelToken, row: Row) -> Result<Vec<Row>> {
        if !self.has_keep_rules() && !self.has_drop_rules() {
            return Ok(vec![row]);
        }
        let mut out = Row::with_capacity(row.len());
        for (key, value) in row {
            if self.includes(&key) {
                out.set(key, value);
            }
        }
        Ok(vec![out])
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p.as_ref()).map_err(|e| Error::invalid_regex(p.as_ref(), e)))
        .collect()
}

// ============================================================================
// Reorder
// ============================================================================

/// Moves the listed columns to the front in the given order
///
/// Entries ending in `.` expand to every present field with that prefix, in
/// the row's own order. Names absent from the row are skipped. Remaining
/// fields follow in their original order.
#[derive(Debug, Clone, Default)]
pub struct ReorderColumnsMiddleware {
    order: Vec<String>,
}

impl ReorderColumnsMiddleware {
    /// Create a reorder middleware
    pub fn new<S: Into<String>>(order: impl IntoIterator<Item = S>) -> Self {
        Self {
            order: order.into_iter().map(Into::into).collect(),
        }
    }
}

impl RowMiddleware for ReorderColumnsMiddleware {
    fn name(&self) -> &'static str {
        "reorder-columns"
    }

    fn process(&mut self, _ctx: &CancelToken, mut row: Row) -> Result<Vec<Row>> {
        if self.order.is_empty() {
            return Ok(vec![row]);
        }
        let mut out = Row::with_capacity(row.len());
        for entry in &self.order {
            if entry.ends_with('.') {
                let matching: Vec<String> = row
                    .keys()
                    .filter(|k| k.starts_with(entry.as_str()))
                    .cloned()
                    .collect();
                for key in matching {
                    if let Some(value) = row.remove(&key) {
                        out.set(key, value);
                    }
                }
            } else if let Some(value) = row.remove(entry) {
                out.set(entry.clone(), value);
            }
        }
        for (key, value) in row {
            out.set(key, value);
        }
        Ok(vec![out])
    }
}

// ============================================================================
// Sort columns
// ============================================================================

/// Sorts a row's keys lexicographically ascending
#[derive(Debug, Clone, Copy, Default)]
pub struct SortColumnsMiddleware;

impl SortColumnsMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl RowMiddleware for SortColumnsMiddleware {
    fn name(&self) -> &'static str {
        "sort-columns"
    }

    fn process(&mut self, _ctx: &CancelToken, row: Row) -> Result<Vec<Row>> {
        let mut pairs: Vec<(String, JsonValue)> = row.into_iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(vec![pairs.into_iter().collect()])
    }
}

// ============================================================================
// Remove nulls
// ============================================================================

/// Drops fields whose value is null
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveNullsMiddleware;

impl RemoveNullsMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl RowMiddleware for RemoveNullsMiddleware {
    fn name(&self) -> &'static str {
        "remove-nulls"
    }

    fn process(&mut self, _ctx: &CancelToken, row: Row) -> Result<Vec<Row>> {
        Ok(vec![row.into_iter().filter(|(_, v)| !v.is_null()).collect()])
    }
}

// ============================================================================
// Add fields
// ============================================================================

/// Appends constant fields after the row's own fields
///
/// A constant whose name already exists overwrites the value in place.
#[derive(Debug, Clone, Default)]
pub struct AddFieldsMiddleware {
    fields: Vec<(String, JsonValue)>,
}

impl AddFieldsMiddleware {
    /// Create the middleware; constants are emitted in iteration order
    pub fn new<K: Into<String>, V: Into<JsonValue>>(
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl RowMiddleware for AddFieldsMiddleware {
    fn name(&self) -> &'static str {
        "add-fields"
    }

    fn process(&mut self, _ctx: &CancelToken, mut row: Row) -> Result<Vec<Row>> {
        for (key, value) in &self.fields {
            row.set(key.clone(), value.clone());
        }
        Ok(vec![row])
    }
}
