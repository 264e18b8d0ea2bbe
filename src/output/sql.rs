//! SQL INSERT formatters
//!
//! Columns are fixed by the first non-empty row. Later rows contribute
//! values for those columns only; missing values are `NULL`.

use super::types::{RowFormatter, TableFormatter};
use crate::error::{Error, Result};
use crate::model::{Row, Table};
use crate::types::{CancelToken, JsonValue};
use std::io::Write;

/// Default target table
pub const DEFAULT_SQL_TABLE: &str = "output";

/// Render one cell as a SQL literal
pub fn value_to_sql(value: Option<&JsonValue>) -> Result<String> {
    let literal = match value {
        None | Some(JsonValue::Null) => "NULL".to_string(),
        Some(JsonValue::Bool(true)) => "TRUE".to_string(),
        Some(JsonValue::Bool(false)) => "FALSE".to_string(),
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(JsonValue::String(s)) => format!("'{}'", s.replace('\'', "''")),
        Some(other) => format!("'{}'", serde_json::to_string(other)?.replace('\'', "''")),
    };
    Ok(literal)
}

/// Streaming statement writer shared by the table and row formatters
#[derive(Debug, Clone)]
pub struct SqlFormatter {
    table_name: String,
    upsert: bool,
    split_by_rows: usize,
    columns: Vec<String>,
    rows_in_statement: usize,
    statement_open: bool,
}

impl Default for SqlFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_SQL_TABLE)
    }
}

impl SqlFormatter {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            upsert: false,
            split_by_rows: 0,
            columns: Vec::new(),
            rows_in_statement: 0,
            statement_open: false,
        }
    }

    /// Append `ON DUPLICATE KEY UPDATE` to every statement
    #[must_use]
    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    /// Start a new statement every `rows` rows (0 = one statement)
    #[must_use]
    pub fn with_split_by_rows(mut self, rows: usize) -> Self {
        self.split_by_rows = rows;
        self
    }

    fn begin(&mut self, w: &mut dyn Write) -> Result<()> {
        writeln!(
            w,
            "INSERT INTO {} ({}) VALUES",
            self.table_name,
            self.columns.join(", ")
        )?;
        self.statement_open = true;
        self.rows_in_statement = 0;
        Ok(())
    }

    fn end(&mut self, w: &mut dyn Write) -> Result<()> {
        if !self.statement_open {
            return Ok(());
        }
        if self.upsert {
            let updates: Vec<String> = self
                .columns
                .iter()
                .map(|c| format!("{c} = VALUES({c})"))
                .collect();
            write!(w, "ON DUPLICATE KEY UPDATE\n{}", updates.join(",\n"))?;
        }
        w.write_all(b";\n")?;
        self.statement_open = false;
        Ok(())
    }

    fn write_row(&mut self, row: &Row, w: &mut dyn Write) -> Result<()> {
        if row.is_empty() {
            return Ok(());
        }
        if self.table_name.is_empty() {
            return Err(Error::output("SQL table name is empty"));
        }
        if self.columns.is_empty() {
            self.columns = row.keys().cloned().collect();
        }
        if self.statement_open
            && self.split_by_rows > 0
            && self.rows_in_statement >= self.split_by_rows
        {
            self.end(w)?;
        }
        let first = !self.statement_open;
        if first {
            self.begin(w)?;
        }

        let values = self
            .columns
            .iter()
            .map(|c| value_to_sql(row.get(c)))
            .collect::<Result<Vec<_>>>()?;
        if !first {
            w.write_all(b", ")?;
        }
        writeln!(w, "({})", values.join(", "))?;
        self.rows_in_statement += 1;
        Ok(())
    }
}

impl TableFormatter for SqlFormatter {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn output(&mut self, ctx: &CancelToken, table: &Table, w: &mut dyn Write) -> Result<()> {
        // Each call is a separate document, e.g. one file per row.
        self.columns.clear();
        self.rows_in_statement = 0;
        self.statement_open = false;
        for row in table.rows() {
            ctx.check()?;
            self.write_row(row, w)?;
        }
        self.end(w)
    }
}

impl RowFormatter for SqlFormatter {
    fn name(&self) -> &'static str {
        "sql-row"
    }

    fn output_row(&mut self, _ctx: &CancelToken, row: &Row, w: &mut dyn Write) -> Result<()> {
        self.write_row(row, w)
    }

    fn close(&mut self, _ctx: &CancelToken, w: &mut dyn Write) -> Result<()> {
        self.end(w)
    }
}
