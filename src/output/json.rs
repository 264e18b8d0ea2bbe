//! JSON formatters

use super::types::{JsonMode, RowFormatter, TableFormatter};
use crate::error::Result;
use crate::model::{Row, Table};
use crate::types::CancelToken;
use std::io::Write;

/// Writes the table as a JSON array of objects, or one object per line
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    mode: JsonMode,
}

impl JsonFormatter {
    pub fn new(mode: JsonMode) -> Self {
        Self { mode }
    }
}

impl TableFormatter for JsonFormatter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn output(&mut self, ctx: &CancelToken, table: &Table, w: &mut dyn Write) -> Result<()> {
        match self.mode {
            JsonMode::Lines => {
                for row in table.rows() {
                    ctx.check()?;
                    serde_json::to_writer(&mut *w, row)?;
                    w.write_all(b"\n")?;
                }
            }
            JsonMode::Array if table.is_empty() => w.write_all(b"[]\n")?,
            JsonMode::Array => {
                w.write_all(b"[\n")?;
                for (i, row) in table.rows().iter().enumerate() {
                    ctx.check()?;
                    if i > 0 {
                        w.write_all(b",\n")?;
                    }
                    serde_json::to_writer_pretty(&mut *w, row)?;
                }
                w.write_all(b"\n]\n")?;
            }
        }
        Ok(())
    }
}

/// Streams one JSON object per row
#[derive(Debug, Clone)]
pub struct JsonRowFormatter {
    pretty: bool,
}

impl Default for JsonRowFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRowFormatter {
    /// Pretty-printed objects
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Compact objects, one per line
    pub fn lines() -> Self {
        Self { pretty: false }
    }
}

impl RowFormatter for JsonRowFormatter {
    fn name(&self) -> &'static str {
        "json-row"
    }

    fn output_row(&mut self, _ctx: &CancelToken, row: &Row, w: &mut dyn Write) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *w, row)?;
        } else {
            serde_json::to_writer(&mut *w, row)?;
        }
        w.write_all(b"\n")?;
        Ok(())
    }
}
