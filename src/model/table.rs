//! Table: rows plus a derived column list

use super::Row;
use std::collections::HashSet;

/// An ordered sequence of rows plus an ordered, duplicate-free column list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
    finalized: bool,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table from rows (not yet finalized)
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    /// Append a row
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
        self.finalized = false;
    }

    /// Append rows in order
    pub fn add_rows(&mut self, rows: impl IntoIterator<Item = Row>) {
        self.rows.extend(rows);
        self.finalized = false;
    }

    /// Place `order` first, then every previously known column not in it
    ///
    /// Names in `order` that are not known columns are kept, so later steps can
    /// produce them.
    pub fn set_column_order(&mut self, order: &[String]) {
        let mut seen = HashSet::with_capacity(order.len() + self.columns.len());
        let mut columns = Vec::with_capacity(order.len() + self.columns.len());
        for name in order.iter().chain(self.columns.iter()) {
            if seen.insert(name.as_str()) {
                columns.push(name.clone());
            }
        }
        self.columns = columns;
    }

    /// Union row fields into the column list in first-seen order
    ///
    /// Idempotent: a second call without new rows changes nothing.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        let mut known: HashSet<String> = self.columns.iter().cloned().collect();
        for row in &self.rows {
            for key in row.keys() {
                if !known.contains(key) {
                    known.insert(key.clone());
                    self.columns.push(key.clone());
                }
            }
        }
        self.finalized = true;
    }

    /// Whether `finalize` ran since the last row was added
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Replace the column list (duplicates are dropped)
    pub fn set_columns(&mut self, columns: Vec<String>) {
        self.columns.clear();
        self.set_column_order(&columns);
    }

    /// Rows in order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Mutable access to the rows
    pub fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    /// Consume the table into its rows
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
