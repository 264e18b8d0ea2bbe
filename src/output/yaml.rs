//! YAML formatter

use super::types::TableFormatter;
use crate::error::Result;
use crate::model::Table;
use crate::types::CancelToken;
use std::io::Write;

/// Writes the table as a YAML sequence of mappings
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormatter;

impl YamlFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl TableFormatter for YamlFormatter {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn output(&mut self, _ctx: &CancelToken, table: &Table, w: &mut dyn Write) -> Result<()> {
        let yaml = serde_yaml::to_string(table.rows())?;
        w.write_all(yaml.as_bytes())?;
        Ok(())
    }
}
