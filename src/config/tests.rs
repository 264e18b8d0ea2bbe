//! Tests for config module

use super::*;
use crate::error::Error;
use crate::model::Row;
use crate::output::{JsonMode, OutputFormat, TableFormat};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, Mutex};

fn rows(value: serde_json::Value) -> Vec<Row> {
    let serde_json::Value::Array(items) = value else {
        panic!("expected array");
    };
    items.into_iter().map(|v| Row::from_value(v).unwrap()).collect()
}

fn run(config: &PipelineConfig, input: serde_json::Value) -> String {
    let mut pipeline = config.build().unwrap();
    pipeline.add_rows(rows(input)).unwrap();
    let mut out = Vec::new();
    pipeline.finish(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn json_lines() -> OutputConfig {
    OutputConfig {
        format: OutputFormat::Json,
        json_mode: JsonMode::Lines,
        ..OutputConfig::default()
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

// ============================================================================
// Loading Tests
// ============================================================================

#[test]
fn test_empty_document_is_default() {
    assert_eq!(load_config_from_str("").unwrap(), PipelineConfig::default());
    let config = PipelineConfig::default();
    assert_eq!(config.output.format, OutputFormat::Table);
    assert!(config.output.with_headers);
    assert_eq!(config.output.sql_table_name, "output");
}

#[test]
fn test_load_yaml() {
    let config = load_config_from_str(
        r"
fields: [name, address.]
flatten: true
sort_by: ['-age']
limit: 2
add_fields:
  source: test
output:
  format: csv
  csv_separator: ';'
  with_headers: false
",
    )
    .unwrap();
    assert_eq!(config.fields, vec!["name", "address."]);
    assert!(config.flatten);
    assert_eq!(config.limit, 2);
    assert_eq!(config.add_fields.get("source"), Some(&json!("test")));
    assert_eq!(config.output.format, OutputFormat::Csv);
    assert_eq!(config.output.table_format, TableFormat::Ascii);
    assert!(!config.output.with_headers);
}

#[test]
fn test_load_rejects_unknown_format() {
    let err = load_config_from_str("output:\n  format: xml\n").unwrap_err();
    assert!(err.is_config_error());
}

#[test]
fn test_load_missing_file() {
    let err = load_config("/definitely/not/here.yaml").unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test]
fn test_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.yaml");
    std::fs::write(&path, "remove_nulls: true\n").unwrap();
    assert!(load_config(&path).unwrap().remove_nulls);
}

// ============================================================================
// Chain Building Tests
// ============================================================================

#[test]
fn test_chain_order() {
    let config = PipelineConfig {
        query: Some(".items[]".to_string()),
        flatten: true,
        template_fields: vec!["full:{{.a}}".to_string()],
        add_fields: json!({"k": 1}).as_object().unwrap().clone(),
        rename: vec!["a:b".to_string()],
        fields: vec!["b".to_string()],
        remove_nulls: true,
        sort_columns: true,
        field_queries: [("b".to_string(), ".x".to_string())].into_iter().collect(),
        skip: 1,
        remove_duplicates: vec!["b".to_string()],
        sort_by: vec!["b".to_string()],
        columns: vec!["b".to_string()],
        output: json_lines(),
        ..PipelineConfig::default()
    };
    let pipeline = config.build().unwrap();
    assert_eq!(
        pipeline.processor().row_middleware_names(),
        vec![
            "object-query",
            "flatten",
            "template-fields",
            "add-fields",
            "rename-columns",
            "fields-filter",
            "remove-nulls",
            "sort-columns",
            "reorder-columns",
            "field-query",
            "skip-limit",
            "remove-duplicates",
        ]
    );
    assert_eq!(
        pipeline.processor().table_middleware_names(),
        vec!["sort-by", "column-order"]
    );
    assert!(!pipeline.is_streaming());
}

#[test]
fn test_table_output_registers_flatten_once() {
    let config = PipelineConfig {
        flatten: true,
        ..PipelineConfig::default()
    };
    let pipeline = config.build().unwrap();
    assert_eq!(pipeline.processor().row_middleware_names(), vec!["flatten"]);

    let pipeline = PipelineConfig::default().build().unwrap();
    assert_eq!(pipeline.processor().row_middleware_names(), vec!["flatten"]);
}

#[test]
fn test_bad_specs_are_config_errors() {
    let bad_rename = PipelineConfig {
        rename: vec!["nocolon".to_string()],
        ..PipelineConfig::default()
    };
    assert!(bad_rename.build().err().unwrap().is_config_error());

    let bad_regex = PipelineConfig {
        regex_fields: vec!["(".to_string()],
        ..PipelineConfig::default()
    };
    assert!(bad_regex.build().err().unwrap().is_config_error());

    let bad_separator = PipelineConfig {
        output: OutputConfig {
            format: OutputFormat::Csv,
            csv_separator: Some(";;".to_string()),
            ..OutputConfig::default()
        },
        ..PipelineConfig::default()
    };
    assert!(bad_separator.build().err().unwrap().is_config_error());
}

#[test]
fn test_template_and_single_need_a_source() {
    let template = PipelineConfig {
        output: OutputConfig {
            format: OutputFormat::Template,
            ..OutputConfig::default()
        },
        ..PipelineConfig::default()
    };
    assert!(template.build().err().unwrap().is_config_error());

    let single = PipelineConfig {
        output: OutputConfig {
            format: OutputFormat::Single,
            ..OutputConfig::default()
        },
        ..PipelineConfig::default()
    };
    assert!(single.build().err().unwrap().is_config_error());
}

// ============================================================================
// End-to-end Tests
// ============================================================================

#[test]
fn test_fields_default_reorder() {
    let config = PipelineConfig {
        fields: vec!["b".to_string(), "a".to_string()],
        output: json_lines(),
        ..PipelineConfig::default()
    };
    let out = run(&config, json!([{"a": 1, "b": 2, "c": 3}]));
    assert_eq!(out, "{\"b\":2,\"a\":1}\n");
}

#[test]
fn test_rename_then_filter_then_limit() {
    let config = PipelineConfig {
        rename: vec!["name:who".to_string()],
        rename_regex: vec!["^x_(.*)$:$1".to_string()],
        filter: vec!["secret".to_string()],
        limit: 2,
        output: json_lines(),
        ..PipelineConfig::default()
    };
    let out = run(
        &config,
        json!([
            {"name": "a", "x_id": 1, "secret": "s"},
            {"name": "b", "x_id": 2, "secret": "s"},
            {"name": "c", "x_id": 3, "secret": "s"}
        ]),
    );
    assert_eq!(out, "{\"who\":\"a\",\"id\":1}\n{\"who\":\"b\",\"id\":2}\n");
}

#[test]
fn test_sort_by_and_columns() {
    let config = PipelineConfig {
        sort_by: vec!["-n".to_string()],
        columns: vec!["n".to_string()],
        output: OutputConfig {
            format: OutputFormat::Csv,
            ..OutputConfig::default()
        },
        ..PipelineConfig::default()
    };
    let out = run(&config, json!([{"id": "a", "n": 1}, {"id": "b", "n": 3}]));
    assert_eq!(out, "n,id\n3,b\n1,a\n");
}

#[test]
fn test_rename_file_merges_with_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("renames.yaml");
    std::fs::write(
        &path,
        "renames:\n  a: alpha\nregexpRenames:\n  '^n_(.*)$': 'num_$1'\n",
    )
    .unwrap();
    let config = PipelineConfig {
        rename: vec!["b:beta".to_string()],
        rename_file: Some(path),
        output: json_lines(),
        ..PipelineConfig::default()
    };
    let out = run(&config, json!([{"a": 1, "b": 2, "n_x": 3}]));
    assert_eq!(out, "{\"alpha\":1,\"beta\":2,\"num_x\":3}\n");
}

#[test]
fn test_template_fields_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.yaml");
    std::fs::write(&path, "greeting: 'hi {{.name}}'\n").unwrap();
    let config = PipelineConfig {
        template_fields: vec![format!("@{}", path.display())],
        fields: vec!["greeting".to_string()],
        output: json_lines(),
        ..PipelineConfig::default()
    };
    let out = run(&config, json!([{"name": "ann"}]));
    assert_eq!(out, "{\"greeting\":\"hi ann\"}\n");
}

#[test]
fn test_object_query_runs_first() {
    let config = PipelineConfig {
        query: Some(".items[]".to_string()),
        output: json_lines(),
        ..PipelineConfig::default()
    };
    let out = run(&config, json!([{"items": [{"id": 1}, {"id": 2}]}]));
    assert_eq!(out, "{\"id\":1}\n{\"id\":2}\n");
}

#[test]
fn test_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let config = PipelineConfig {
        output: OutputConfig {
            format: OutputFormat::Csv,
            output_file: Some(path.display().to_string()),
            ..OutputConfig::default()
        },
        ..PipelineConfig::default()
    };
    let out = run(&config, json!([{"a": 1}]));
    assert_eq!(out, format!("Wrote output to {}\n", path.display()));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\n1\n");
}

// ============================================================================
// Streaming Tests
// ============================================================================

#[test]
fn test_streaming_json_lines() {
    let config = PipelineConfig {
        limit: 1,
        output: OutputConfig {
            stream: true,
            ..json_lines()
        },
        ..PipelineConfig::default()
    };
    let buffer = SharedBuffer::default();
    let mut pipeline = config.build_streaming(buffer.clone()).unwrap();
    assert!(pipeline.is_streaming());
    assert_eq!(
        pipeline.processor().row_middleware_names().last(),
        Some(&"output")
    );

    pipeline.add_row(Row::from_value(json!({"a": 1})).unwrap()).unwrap();
    assert_eq!(buffer.contents(), "{\"a\":1}\n");
    pipeline.add_row(Row::from_value(json!({"a": 2})).unwrap()).unwrap();

    let mut sink = Vec::new();
    pipeline.finish(&mut sink).unwrap();
    assert!(sink.is_empty());
    assert_eq!(buffer.contents(), "{\"a\":1}\n");
}

#[test]
fn test_streaming_rejects_batch_formats() {
    let config = PipelineConfig {
        output: OutputConfig {
            format: OutputFormat::Csv,
            stream: true,
            ..OutputConfig::default()
        },
        ..PipelineConfig::default()
    };
    let err = config.build_streaming(SharedBuffer::default()).err().unwrap();
    assert!(err.is_config_error());
}
