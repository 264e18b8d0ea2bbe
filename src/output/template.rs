//! Template formatter

use super::types::TableFormatter;
use crate::error::Result;
use crate::middleware::FlattenMiddleware;
use crate::model::Table;
use crate::processor::Processor;
use crate::template::Template;
use crate::types::{CancelToken, JsonObject, JsonValue};
use std::io::Write;

/// Renders one template against `{rows: [...], data: <additional>}`
#[derive(Debug, Clone)]
pub struct TemplateFormatter {
    template: Template,
    data: JsonValue,
}

impl TemplateFormatter {
    pub fn new(source: &str) -> Result<Self> {
        Ok(Self {
            template: Template::parse(source)?,
            data: JsonValue::Object(JsonObject::new()),
        })
    }

    /// Extra value exposed as `.data`
    #[must_use]
    pub fn with_additional_data(mut self, data: JsonValue) -> Self {
        self.data = data;
        self
    }

    /// Fail on missing keys instead of rendering them empty
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.template = self.template.with_strict(strict);
        self
    }
}

impl TableFormatter for TemplateFormatter {
    fn name(&self) -> &'static str {
        "template"
    }

    fn register_middlewares(&self, processor: &mut Processor) -> Result<()> {
        if !processor.row_middleware_names().contains(&"flatten") {
            processor.prepend_row_middleware(FlattenMiddleware::new());
        }
        Ok(())
    }

    fn output(&mut self, _ctx: &CancelToken, table: &Table, w: &mut dyn Write) -> Result<()> {
        let rows: Vec<JsonValue> = table
            .rows()
            .iter()
            .map(|row| JsonValue::Object(row.as_map().clone()))
            .collect();
        let mut context = JsonObject::new();
        context.insert("rows".to_string(), JsonValue::Array(rows));
        context.insert("data".to_string(), self.data.clone());

        let rendered = self.template.render(&JsonValue::Object(context))?;
        w.write_all(rendered.as_bytes())?;
        Ok(())
    }
}
