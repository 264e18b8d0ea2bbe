//! Loading configs and building pipelines from them

use super::pipeline::Pipeline;
use super::types::{OutputConfig, PipelineConfig};
use crate::error::{Error, Result};
use crate::middleware::{
    AddFieldsMiddleware, ColumnOrderMiddleware, FieldQueryMiddleware, FieldsFilterMiddleware,
    FlattenMiddleware, ObjectQueryMiddleware, OutputMiddleware, RegexRename,
    RemoveDuplicatesMiddleware, RemoveNullsMiddleware, RenameColumnsMiddleware,
    ReorderColumnsMiddleware, ReplaceMiddleware, SkipLimitMiddleware, SortByMiddleware,
    SortColumnsMiddleware, TemplateFieldsMiddleware,
};
use crate::output::{
    CsvFormatter, FileOutputFormatter, JsonFormatter, JsonMode, JsonRowFormatter, OutputFormat,
    RowFormatter, SingleColumnFormatter, SqlFormatter, TableFormatter, TableOutputFormatter,
    TableStyle, TemplateFormatter, YamlFormatter,
};
use crate::processor::Processor;
use serde_yaml::Value as YamlValue;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Load a pipeline config from a YAML (or JSON) file
pub fn load_config(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        }
    })?;
    load_config_from_str(&content)
}

/// Parse a pipeline config; YAML is a superset of JSON so both are accepted
pub fn load_config_from_str(content: &str) -> Result<PipelineConfig> {
    if content.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }
    let config: PipelineConfig = serde_yaml::from_str(content)
        .map_err(|e| Error::config(format!("Failed to parse pipeline config: {e}")))?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|_| Error::FileNotFound {
        path: path.display().to_string(),
    })
}

fn split_pair<'a>(field: &str, spec: &'a str, last: bool) -> Result<(&'a str, &'a str)> {
    let pair = if last {
        spec.rsplit_once(':')
    } else {
        spec.split_once(':')
    };
    pair.ok_or_else(|| Error::invalid_value(field, format!("expected 'a:b', got '{spec}'")))
}

impl PipelineConfig {
    /// Build a pipeline that renders the table once all rows are in
    pub fn build(&self) -> Result<Pipeline> {
        let formatter = self.output.formatter()?;
        let mut processor = self.processor()?;
        formatter.register_middlewares(&mut processor)?;
        self.prepend_object_query(&mut processor)?;
        Ok(Pipeline::new(processor, Some(formatter)))
    }

    /// Build a pipeline that writes each row to `writer` as it passes
    pub fn build_streaming(&self, writer: impl Write + Send + 'static) -> Result<Pipeline> {
        let formatter = self.output.row_formatter()?;
        let mut processor = self.processor()?;
        formatter.register_middlewares(&mut processor)?;
        self.prepend_object_query(&mut processor)?;
        processor.append_row_middleware(OutputMiddleware::new(formatter, writer));
        Ok(Pipeline::new(processor, None))
    }

    fn prepend_object_query(&self, processor: &mut Processor) -> Result<()> {
        if let Some(query) = self.query.as_deref().filter(|q| !q.trim().is_empty()) {
            processor.prepend_row_middleware(ObjectQueryMiddleware::new(query)?);
        }
        Ok(())
    }

    /// The processor with every configured middleware except the object query
    fn processor(&self) -> Result<Processor> {
        let mut p = Processor::new();

        if self.flatten {
            p.append_row_middleware(FlattenMiddleware::new());
        }
        let templates = self.template_field_specs()?;
        if !templates.is_empty() {
            let mut mw = TemplateFieldsMiddleware::new(templates)?;
            if let Some(sep) = &self.template_rename_separator {
                mw = mw.with_rename_separator(sep.clone());
            }
            p.append_row_middleware(mw);
        }
        if !self.add_fields.is_empty() {
            p.append_row_middleware(AddFieldsMiddleware::new(self.add_fields.clone()));
        }
        if let Some(rename) = self.rename_middleware()? {
            p.append_row_middleware(rename);
        }
        if let Some(path) = &self.replace_file {
            p.append_row_middleware(ReplaceMiddleware::from_file(path)?);
        }
        if !(self.fields.is_empty()
            && self.filter.is_empty()
            && self.regex_fields.is_empty()
            && self.regex_filter.is_empty())
        {
            let mw = FieldsFilterMiddleware::new(&self.fields, &self.filter)
                .with_regex_fields(&self.regex_fields)?
                .with_regex_filters(&self.regex_filter)?;
            p.append_row_middleware(mw);
        }
        if self.remove_nulls {
            p.append_row_middleware(RemoveNullsMiddleware::new());
        }
        if self.sort_columns {
            p.append_row_middleware(SortColumnsMiddleware::new());
        }
        let reorder = if self.reorder.is_empty() {
            &self.fields
        } else {
            &self.reorder
        };
        if !reorder.is_empty() {
            p.append_row_middleware(ReorderColumnsMiddleware::new(reorder.iter().cloned()));
        }
        if !self.field_queries.is_empty() {
            p.append_row_middleware(FieldQueryMiddleware::new(&self.field_queries)?);
        }
        if self.skip > 0 || self.limit > 0 {
            p.append_row_middleware(SkipLimitMiddleware::new(self.skip, self.limit));
        }
        if !self.remove_duplicates.is_empty() {
            p.append_row_middleware(RemoveDuplicatesMiddleware::new(
                self.remove_duplicates.iter().cloned(),
            ));
        }

        if !self.sort_by.is_empty() {
            p.append_table_middleware(SortByMiddleware::new(&self.sort_by));
        }
        if !self.columns.is_empty() {
            p.append_table_middleware(ColumnOrderMiddleware::new(self.columns.iter().cloned()));
        }

        debug!(
            row = ?p.row_middleware_names(),
            table = ?p.table_middleware_names(),
            "Built middleware chains"
        );
        Ok(p)
    }

    fn rename_middleware(&self) -> Result<Option<RenameColumnsMiddleware>> {
        if self.rename.is_empty() && self.rename_regex.is_empty() && self.rename_file.is_none() {
            return Ok(None);
        }
        let mut renames = HashMap::new();
        let mut regex_renames = Vec::new();
        if let Some(path) = &self.rename_file {
            let content = read_file(path)?;
            let (file_renames, file_regex) = RenameColumnsMiddleware::from_yaml(&content)?.into_rules();
            renames.extend(file_renames);
            regex_renames.extend(file_regex);
        }
        for spec in &self.rename {
            let (from, to) = split_pair("rename", spec, false)?;
            renames.insert(from.to_string(), to.to_string());
        }
        for spec in &self.rename_regex {
            let (pattern, replacement) = split_pair("rename_regex", spec, true)?;
            regex_renames.push(RegexRename::new(pattern, replacement)?);
        }
        Ok(Some(RenameColumnsMiddleware::new(renames, regex_renames)))
    }

    /// `(name, template)` pairs in declaration order
    fn template_field_specs(&self) -> Result<Vec<(String, String)>> {
        let mut specs = Vec::new();
        for spec in &self.template_fields {
            if let Some(path) = spec.strip_prefix('@') {
                let content = read_file(Path::new(path))?;
                let doc: YamlValue = serde_yaml::from_str(&content)?;
                let YamlValue::Mapping(map) = doc else {
                    return Err(Error::invalid_value(
                        "template_fields",
                        format!("'{path}' must contain a mapping of field to template"),
                    ));
                };
                for (name, template) in map {
                    match (name.as_str(), template.as_str()) {
                        (Some(name), Some(template)) => {
                            specs.push((name.to_string(), template.to_string()));
                        }
                        _ => {
                            return Err(Error::invalid_value(
                                "template_fields",
                                format!("'{path}' entries must be strings"),
                            ))
                        }
                    }
                }
            } else {
                let (name, template) = split_pair("template_fields", spec, false)?;
                specs.push((name.to_string(), template.to_string()));
            }
        }
        Ok(specs)
    }
}

impl OutputConfig {
    fn csv_separator(&self, default: u8) -> Result<u8> {
        match self.csv_separator.as_deref() {
            None | Some("") => Ok(default),
            Some("\\t") => Ok(b'\t'),
            Some(s) if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
            Some(s) => Err(Error::invalid_value(
                "output.csv_separator",
                format!("expected a single ASCII character, got '{s}'"),
            )),
        }
    }

    fn table_style(&self) -> Result<TableStyle> {
        match (&self.table_style_file, &self.table_style) {
            (Some(path), _) => TableStyle::from_file(path),
            (None, Some(name)) => Ok(TableStyle::named(name)),
            (None, None) => Ok(TableStyle::default()),
        }
    }

    fn template_source(&self) -> Result<String> {
        match (&self.template_file, &self.template) {
            (Some(path), _) => read_file(path),
            (None, Some(source)) => Ok(source.clone()),
            (None, None) => Err(Error::config(
                "template output needs a template or a template file",
            )),
        }
    }

    fn single_column(&self) -> Result<SingleColumnFormatter> {
        let formatter = match (&self.select_template, &self.select_field) {
            (Some(source), _) => SingleColumnFormatter::from_template(source)?,
            (None, Some(field)) => SingleColumnFormatter::new(field.clone()),
            (None, None) => {
                return Err(Error::config(
                    "single output needs a select field or a select template",
                ))
            }
        };
        Ok(match &self.select_separator {
            Some(sep) => formatter.with_separator(sep.clone()),
            None => formatter,
        })
    }

    fn sql(&self) -> SqlFormatter {
        SqlFormatter::new(self.sql_table_name.clone())
            .with_upsert(self.sql_upsert)
            .with_split_by_rows(self.sql_split_by_rows)
    }

    /// The batch formatter, wrapped for file output when requested
    pub fn formatter(&self) -> Result<Box<dyn TableFormatter>> {
        let formatter: Box<dyn TableFormatter> = match self.format {
            OutputFormat::Table => Box::new(
                TableOutputFormatter::new(self.table_format).with_style(self.table_style()?),
            ),
            OutputFormat::Csv => Box::new(
                CsvFormatter::new()
                    .with_headers(self.with_headers)
                    .with_separator(self.csv_separator(b',')?),
            ),
            OutputFormat::Tsv => Box::new(
                CsvFormatter::tsv()
                    .with_headers(self.with_headers)
                    .with_separator(self.csv_separator(b'\t')?),
            ),
            OutputFormat::Json => Box::new(JsonFormatter::new(self.json_mode)),
            OutputFormat::Yaml => Box::new(YamlFormatter::new()),
            OutputFormat::Sql => Box::new(self.sql()),
            OutputFormat::Template => {
                let mut formatter = TemplateFormatter::new(&self.template_source()?)?;
                if let Some(data) = &self.template_data {
                    formatter = formatter.with_additional_data(data.clone());
                }
                Box::new(formatter)
            }
            OutputFormat::Single => Box::new(self.single_column()?),
        };

        if self.output_file.is_none() && !self.output_multiple_files {
            return Ok(formatter);
        }
        let mut wrapped =
            FileOutputFormatter::from_boxed(formatter).with_multiple_files(self.output_multiple_files);
        if let Some(path) = &self.output_file {
            wrapped = wrapped.with_output_file(path.clone());
        }
        if let Some(template) = &self.output_file_template {
            wrapped = wrapped.with_file_template(template)?;
        }
        Ok(Box::new(wrapped))
    }

    /// The streaming formatter for formats that support it
    pub fn row_formatter(&self) -> Result<Box<dyn RowFormatter>> {
        Ok(match self.format {
            OutputFormat::Json => match self.json_mode {
                JsonMode::Lines => Box::new(JsonRowFormatter::lines()),
                JsonMode::Array => Box::new(JsonRowFormatter::new()),
            },
            OutputFormat::Sql => Box::new(self.sql()),
            OutputFormat::Single => Box::new(self.single_column()?),
            other => {
                return Err(Error::invalid_value(
                    "output.stream",
                    format!("{other} output cannot be streamed"),
                ))
            }
        })
    }
}
