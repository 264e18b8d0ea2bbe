//! Single-column formatter: one field (or template) per row

use super::types::{RowFormatter, TableFormatter};
use crate::error::Result;
use crate::model::{value_to_string, Row, Table};
use crate::template::Template;
use crate::types::CancelToken;
use std::io::Write;

#[derive(Debug, Clone)]
enum Selector {
    Field(String),
    Template(Template),
}

/// Emits one value per row, joined with a separator
///
/// In field mode rows without the field are skipped. In template mode the
/// template is rendered against each row.
#[derive(Debug, Clone)]
pub struct SingleColumnFormatter {
    selector: Selector,
    separator: String,
    emitted: usize,
}

impl SingleColumnFormatter {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            selector: Selector::Field(field.into()),
            separator: "\n".to_string(),
            emitted: 0,
        }
    }

    /// Render `source` against each row instead of selecting a field
    pub fn from_template(source: &str) -> Result<Self> {
        Ok(Self {
            selector: Selector::Template(Template::parse(source)?),
            separator: "\n".to_string(),
            emitted: 0,
        })
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    fn select(&self, row: &Row) -> Result<Option<String>> {
        match &self.selector {
            Selector::Field(field) => Ok(row.get(field).map(value_to_string)),
            Selector::Template(template) => {
                let context = serde_json::Value::Object(row.as_map().clone());
                template.render(&context).map(Some)
            }
        }
    }

    fn emit(&mut self, row: &Row, w: &mut dyn Write) -> Result<()> {
        if let Some(text) = self.select(row)? {
            if self.emitted > 0 {
                w.write_all(self.separator.as_bytes())?;
            }
            w.write_all(text.as_bytes())?;
            self.emitted += 1;
        }
        Ok(())
    }
}

impl TableFormatter for SingleColumnFormatter {
    fn name(&self) -> &'static str {
        "single"
    }

    fn output(&mut self, ctx: &CancelToken, table: &Table, w: &mut dyn Write) -> Result<()> {
        self.emitted = 0;
        for row in table.rows() {
            ctx.check()?;
            self.emit(row, w)?;
        }
        Ok(())
    }
}

impl RowFormatter for SingleColumnFormatter {
    fn name(&self) -> &'static str {
        "single-row"
    }

    fn output_row(&mut self, _ctx: &CancelToken, row: &Row, w: &mut dyn Write) -> Result<()> {
        self.emit(row, w)
    }
}
