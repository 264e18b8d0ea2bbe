//! CLI runner - reads input, runs the pipeline, writes to stdout

use crate::cli::commands::{Cli, Commands, PipelineArgs};
use crate::config::{load_config, PipelineConfig};
use crate::error::{Error, Result, ResultExt};
use crate::input::{InputConfig, InputFormat};
use crate::types::{split_list, JsonValue};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub fn run(&self) -> Result<()> {
        let config = self.pipeline_config()?;
        let (input, files) = self.input()?;
        let reader = input.reader()?;

        let mut pipeline = if config.output.stream {
            config.build_streaming(io::stdout())?
        } else {
            config.build()?
        };

        let start = Instant::now();
        if files.is_empty() {
            let mut body = String::new();
            io::stdin().read_to_string(&mut body)?;
            let rows = reader
                .read(&body)
                .map_err(|e| e.in_stage("input '<stdin>'"))?;
            debug!(rows = rows.len(), "Read standard input");
            pipeline.add_rows(rows)?;
        }
        for path in files {
            let body = read_input(path)?;
            let rows = reader
                .read(&body)
                .map_err(|e| e.in_stage(format!("input '{}'", path.display())))?;
            debug!(path = %path.display(), rows = rows.len(), "Read input file");
            pipeline.add_rows(rows)?;
        }

        pipeline.finish(&mut io::stdout())?;
        info!(
            rows = pipeline.stats().rows_final,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Done"
        );
        Ok(())
    }

    /// Config file (if any) overlaid with command line flags
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.cli.config {
            Some(path) => load_config(path)?,
            None => PipelineConfig::default(),
        };
        apply_args(&self.cli.pipeline, &mut config)?;
        Ok(config)
    }

    fn input(&self) -> Result<(InputConfig, &[PathBuf])> {
        Ok(match &self.cli.command {
            Commands::Json {
                files,
                record_path,
                lines,
            } => {
                let format = if *lines {
                    InputFormat::Jsonl
                } else {
                    InputFormat::Json
                };
                let mut input = InputConfig::new(format);
                input.record_path.clone_from(record_path);
                (input, files.as_slice())
            }
            Commands::Yaml { files, record_path } => {
                let mut input = InputConfig::new(InputFormat::Yaml);
                input.record_path.clone_from(record_path);
                (input, files.as_slice())
            }
            Commands::Csv {
                files,
                delimiter,
                tsv,
            } => {
                let format = if *tsv { InputFormat::Tsv } else { InputFormat::Csv };
                let mut input = InputConfig::new(format);
                if let Some(c) = delimiter {
                    let byte = u8::try_from(*c).ok().filter(u8::is_ascii).ok_or_else(|| {
                        Error::invalid_value("delimiter", format!("'{c}' is not ASCII"))
                    })?;
                    input.delimiter = Some(byte);
                }
                (input, files.as_slice())
            }
        })
    }
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::Io(e)
        }
    })
}

fn comma_lists(values: &[String]) -> Vec<String> {
    values.iter().flat_map(|v| split_list(v)).collect()
}

fn pair<'a>(flag: &str, spec: &'a str) -> Result<(&'a str, &'a str)> {
    spec.split_once(':')
        .ok_or_else(|| Error::invalid_value(flag, format!("expected 'name:value', got '{spec}'")))
}

/// Overlay command line flags on a config; flags that were not given leave it alone
pub fn apply_args(args: &PipelineArgs, config: &mut PipelineConfig) -> Result<()> {
    config.fields.extend(comma_lists(&args.fields));
    config.filter.extend(comma_lists(&args.filter));
    config.regex_fields.extend(args.regex_fields.iter().cloned());
    config.regex_filter.extend(args.regex_filter.iter().cloned());
    config.sort_by.extend(comma_lists(&args.sort_by));
    config.columns.extend(comma_lists(&args.columns));
    config
        .remove_duplicates
        .extend(comma_lists(&args.remove_duplicates));
    config.rename.extend(args.rename.iter().cloned());
    config.rename_regex.extend(args.rename_regex.iter().cloned());
    config
        .template_fields
        .extend(args.template_fields.iter().cloned());

    config.flatten |= args.flatten;
    config.sort_columns |= args.sort_columns;
    config.remove_nulls |= args.remove_nulls;

    if let Some(skip) = args.skip {
        config.skip = skip;
    }
    if let Some(limit) = args.limit {
        config.limit = limit;
    }
    if args.rename_file.is_some() {
        config.rename_file.clone_from(&args.rename_file);
    }
    if args.replace_file.is_some() {
        config.replace_file.clone_from(&args.replace_file);
    }
    if args.template_rename_separator.is_some() {
        config
            .template_rename_separator
            .clone_from(&args.template_rename_separator);
    }
    if args.query.is_some() {
        config.query.clone_from(&args.query);
    }
    for spec in &args.add_fields {
        let (name, raw) = pair("add-field", spec)?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::from(raw));
        config.add_fields.insert(name.to_string(), value);
    }
    for spec in &args.field_queries {
        let (field, query) = pair("field-query", spec)?;
        config
            .field_queries
            .insert(field.to_string(), query.to_string());
    }

    let output = &mut config.output;
    if let Some(format) = args.output {
        output.format = format;
    }
    if let Some(table_format) = args.table_format {
        output.table_format = table_format;
    }
    if let Some(json_mode) = args.json_mode {
        output.json_mode = json_mode;
    }
    if let Some(with_headers) = args.with_headers {
        output.with_headers = with_headers;
    }
    if let Some(rows) = args.sql_split_by_rows {
        output.sql_split_by_rows = rows;
    }
    if let Some(name) = &args.sql_table_name {
        output.sql_table_name.clone_from(name);
    }
    if let Some(data) = &args.template_data {
        let value: JsonValue =
            serde_json::from_str(data).with_context(|| "invalid --template-data".to_string())?;
        output.template_data = Some(value);
    }
    output.sql_upsert |= args.sql_upsert;
    output.output_multiple_files |= args.output_multiple_files;
    output.stream |= args.stream;

    let overrides = [
        (&mut output.table_style, &args.table_style),
        (&mut output.csv_separator, &args.csv_separator),
        (&mut output.template, &args.template),
        (&mut output.output_file, &args.output_file),
        (&mut output.output_file_template, &args.output_file_template),
        (&mut output.select_field, &args.select),
        (&mut output.select_template, &args.select_template),
        (&mut output.select_separator, &args.select_separator),
    ];
    for (target, flag) in overrides {
        if flag.is_some() {
            target.clone_from(flag);
        }
    }
    if args.table_style_file.is_some() {
        output.table_style_file.clone_from(&args.table_style_file);
    }
    if args.template_file.is_some() {
        output.template_file.clone_from(&args.template_file);
    }
    Ok(())
}
