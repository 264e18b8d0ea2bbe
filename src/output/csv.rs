//! CSV / TSV formatter

use super::types::TableFormatter;
use crate::error::Result;
use crate::middleware::FlattenMiddleware;
use crate::model::{value_to_string, Table};
use crate::processor::Processor;
use crate::types::CancelToken;
use std::io::Write;

/// Writes the table as delimited text with standard CSV quoting
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    with_headers: bool,
    separator: u8,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFormatter {
    /// Comma separated, with a header row
    pub fn new() -> Self {
        Self {
            with_headers: true,
            separator: b',',
        }
    }

    /// Tab separated, with a header row
    pub fn tsv() -> Self {
        Self::new().with_separator(b'\t')
    }

    #[must_use]
    pub fn with_headers(mut self, with_headers: bool) -> Self {
        self.with_headers = with_headers;
        self
    }

    #[must_use]
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }
}

impl TableFormatter for CsvFormatter {
    fn name(&self) -> &'static str {
        if self.separator == b'\t' {
            "tsv"
        } else {
            "csv"
        }
    }

    fn register_middlewares(&self, processor: &mut Processor) -> Result<()> {
        if !processor.row_middleware_names().contains(&"flatten") {
            processor.prepend_row_middleware(FlattenMiddleware::new());
        }
        Ok(())
    }

    fn output(&mut self, ctx: &CancelToken, table: &Table, w: &mut dyn Write) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.separator)
            .has_headers(false)
            .from_writer(w);

        if self.with_headers && !table.columns().is_empty() {
            writer.write_record(table.columns())?;
        }
        for row in table.rows() {
            ctx.check()?;
            let record: Vec<String> = table
                .columns()
                .iter()
                .map(|c| row.get(c).map(value_to_string).unwrap_or_default())
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
