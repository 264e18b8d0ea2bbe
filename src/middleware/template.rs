//! Templated field middleware

use super::types::RowMiddleware;
use crate::error::Result;
use crate::model::Row;
use crate::template::Template;
use crate::types::{CancelToken, JsonObject, JsonValue};

/// Renders templates against each row and stores the results as fields
///
/// All templates see the incoming row; results are applied once every
/// template has rendered, so templates cannot observe each other. Existing
/// target fields keep their position, new ones are appended.
#[derive(Debug, Clone, Default)]
pub struct TemplateFieldsMiddleware {
    templates: Vec<(String, Template)>,
    rename_separator: Option<String>,
}

impl TemplateFieldsMiddleware {
    /// Parse `(target field, template source)` pairs
    pub fn new<K, V, I>(templates: I) -> Result<Self>
    where
        K: Into<String>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let templates = templates
            .into_iter()
            .map(|(field, source)| Ok((field.into(), Template::parse(source.as_ref())?)))
            .collect::<Result<_>>()?;
        Ok(Self {
            templates,
            rename_separator: None,
        })
    }

    /// Replace `.` in source field names with `separator` inside the template context
    #[must_use]
    pub fn with_rename_separator(mut self, separator: impl Into<String>) -> Self {
        self.rename_separator = Some(separator.into());
        self
    }

    /// Build the template context for a row, including the `_row` alias
    fn context(&self, row: &Row) -> JsonValue {
        let mut ctx: JsonObject = row
            .iter()
            .map(|(k, v)| {
                let key = match &self.rename_separator {
                    Some(sep) => k.replace('.', sep),
                    None => k.clone(),
                };
                (key, v.clone())
            })
            .collect();
        let alias = JsonValue::Object(ctx.clone());
        ctx.insert("_row".to_string(), alias);
        JsonValue::Object(ctx)
    }
}

impl RowMiddleware for TemplateFieldsMiddleware {
    fn name(&self) -> &'static str {
        "template-fields"
    }

    fn process(&mut self, _ctx: &CancelToken, mut row: Row) -> Result<Vec<Row>> {
        if self.templates.is_empty() {
            return Ok(vec![row]);
        }
        let context = self.context(&row);
        let rendered = self
            .templates
            .iter()
            .map(|(field, template)| Ok((field.clone(), template.render(&context)?)))
            .collect::<Result<Vec<_>>>()?;
        for (field, value) in rendered {
            row.set(field, JsonValue::String(value));
        }
        Ok(vec![row])
    }
}
