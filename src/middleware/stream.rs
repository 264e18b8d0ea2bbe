//! Stateful streaming row middlewares: skip/limit and remove-duplicates

use super::types::RowMiddleware;
use crate::error::Result;
use crate::model::Row;
use crate::types::{CancelToken, JsonValue};

// ============================================================================
// Skip / Limit
// ============================================================================

/// Drops the first `skip` rows, then passes at most `limit` rows
///
/// A non-positive skip means no skipping; a non-positive limit means no limit.
#[derive(Debug, Clone, Default)]
pub struct SkipLimitMiddleware {
    skip: usize,
    limit: Option<usize>,
    seen: usize,
}

impl SkipLimitMiddleware {
    /// Create the middleware
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip: usize::try_from(skip).unwrap_or(0),
            limit: usize::try_from(limit).ok().filter(|l| *l > 0),
            seen: 0,
        }
    }
}

impl RowMiddleware for SkipLimitMiddleware {
    fn name(&self) -> &'static str {
        "skip-limit"
    }

    fn process(&mut self, _ctx: &CancelToken, row: Row) -> Result<Vec<Row>> {
        let index = self.seen;
        self.seen += 1;
        if index < self.skip {
            return Ok(Vec::new());
        }
        match self.limit {
            Some(limit) if index - self.skip >= limit => Ok(Vec::new()),
            _ => Ok(vec![row]),
        }
    }
}

// ============================================================================
// Remove duplicates
// ============================================================================

/// Drops a row when every key column is present and equal on it and on the
/// previous emitted row
///
/// A key column absent on either side makes the rows different, so absent
/// vs null and absent vs absent never match.
#[derive(Debug, Clone, Default)]
pub struct RemoveDuplicatesMiddleware {
    columns: Vec<String>,
    previous: Option<Vec<Option<JsonValue>>>,
}

impl RemoveDuplicatesMiddleware {
    /// Create the middleware comparing on `columns`
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            previous: None,
        }
    }

    fn project(&self, row: &Row) -> Vec<Option<JsonValue>> {
        self.columns.iter().map(|c| row.get(c).cloned()).collect()
    }

    fn is_duplicate(&self, key: &[Option<JsonValue>]) -> bool {
        let Some(previous) = &self.previous else {
            return false;
        };
        previous
            .iter()
            .zip(key)
            .all(|pair| matches!(pair, (Some(a), Some(b)) if a == b))
    }
}

impl RowMiddleware for RemoveDuplicatesMiddleware {
    fn name(&self) -> &'static str {
        "remove-duplicates"
    }

    fn process(&mut self, _ctx: &CancelToken, row: Row) -> Result<Vec<Row>> {
        let key = self.project(&row);
        if self.is_duplicate(&key) {
            return Ok(Vec::new());
        }
        self.previous = Some(key);
        Ok(vec![row])
    }
}
