//! Integration tests
//!
//! Drive the public API end to end: config → pipeline → formatter output

use pretty_assertions::assert_eq;
use rowsmith::config::{load_config_from_str, OutputConfig, PipelineConfig};
use rowsmith::input::{InputConfig, InputFormat};
use rowsmith::output::{JsonMode, OutputFormat, TableFormat};
use rowsmith::{Error, Row};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::{Arc, Mutex};

fn rows(value: Value) -> Vec<Row> {
    let Value::Array(items) = value else {
        panic!("expected an array of records");
    };
    items.into_iter().map(|v| Row::from_value(v).unwrap()).collect()
}

fn run(config: &PipelineConfig, input: Value) -> String {
    let mut pipeline = config.build().unwrap();
    pipeline.add_rows(rows(input)).unwrap();
    let mut out = Vec::new();
    pipeline.finish(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn output(format: OutputFormat) -> OutputConfig {
    OutputConfig {
        format,
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

// ============================================================================
// Scenario Tests
// ============================================================================

#[test]
fn test_flatten_filter_markdown() {
    let config = PipelineConfig {
        filter: vec!["b.c".to_string()],
        output: OutputConfig {
            table_format: TableFormat::Markdown,
            ..OutputConfig::default()
        },
        ..PipelineConfig::default()
    };
    let out = run(&config, json!([{"a": 1, "b": {"c": 2, "d": 3}}]));
    assert_eq!(out, "| a | b.d |\n| - | --- |\n| 1 | 3   |\n");
}

#[test]
fn test_rename_and_regex_rename_csv() {
    let config = PipelineConfig {
        rename: vec!["foo:bar".to_string()],
        rename_regex: vec!["^foo(.*)$:bar$1".to_string()],
        output: output(OutputFormat::Csv),
        ..PipelineConfig::default()
    };
    let out = run(&config, json!([{"foo": 1, "baz": 2, "foobar": 3}]));
    assert_eq!(out, "bar,baz,barbar\n1,2,3\n");
}

#[test]
fn test_sort_by_descending_json() {
    let config = PipelineConfig {
        sort_by: vec!["-a".to_string()],
        output: output(OutputFormat::Json),
        ..PipelineConfig::default()
    };
    let out = run(
        &config,
        json!([{"a": 1, "b": 2}, {"a": 3, "b": 1}, {"a": 2, "b": 9}]),
    );
    let parsed: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        parsed,
        json!([{"a": 3, "b": 1}, {"a": 2, "b": 9}, {"a": 1, "b": 2}])
    );
}

#[test]
fn test_remove_duplicates() {
    let config = PipelineConfig {
        remove_duplicates: vec!["a".to_string(), "b".to_string()],
        output: OutputConfig {
            format: OutputFormat::Json,
            json_mode: JsonMode::Lines,
            ..OutputConfig::default()
        },
        ..PipelineConfig::default()
    };
    let out = run(
        &config,
        json!([{"a": 1, "b": 2, "c": 3}, {"a": 1, "b": 2, "c": 4}, {"a": 4, "b": 5, "c": 6}]),
    );
    assert_eq!(out, "{\"a\":1,\"b\":2,\"c\":3}\n{\"a\":4,\"b\":5,\"c\":6}\n");
}

#[test]
fn test_sql_upsert() {
    let config = PipelineConfig {
        output: OutputConfig {
            format: OutputFormat::Sql,
            sql_upsert: true,
            ..OutputConfig::default()
        },
        ..PipelineConfig::default()
    };
    let out = run(&config, json!([{"foo": "bar", "baz": "qux"}]));
    assert_eq!(
        out,
        "INSERT INTO output (foo, baz) VALUES\n('bar', 'qux')\nON DUPLICATE KEY UPDATE\nfoo = VALUES(foo),\nbaz = VALUES(baz);\n"
    );
}

#[test]
fn test_template_fields_with_dotted_names() {
    let config = load_config_from_str(
        r#"
template_fields:
  - "b.d:{{.a}}-{{.b_d}}"
  - "a:{{.a}}-{{.b_d}}"
template_rename_separator: _
output:
  format: json
  json_mode: lines
"#,
    )
    .unwrap();
    let out = run(&config, json!([{"b.d": "v2", "a": "v1"}]));
    assert_eq!(out, "{\"b.d\":\"v1-v2\",\"a\":\"v1-v2\"}\n");
}

// ============================================================================
// Driver Tests
// ============================================================================

#[test]
fn test_yaml_input_to_tsv() {
    let reader = InputConfig::new(InputFormat::Yaml)
        .with_record_path("$.people")
        .reader()
        .unwrap();
    let records = reader
        .read("people:\n  - name: ann\n    tags: [a, b]\n  - name: bob\n")
        .unwrap();

    let config = PipelineConfig {
        output: output(OutputFormat::Tsv),
        ..PipelineConfig::default()
    };
    let mut pipeline = config.build().unwrap();
    pipeline.add_rows(records).unwrap();
    let mut out = Vec::new();
    pipeline.finish(&mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "name\ttags\nann\ta, b\nbob\t\n"
    );
}

#[test]
fn test_streaming_sql() {
    let config = PipelineConfig {
        output: OutputConfig {
            format: OutputFormat::Sql,
            sql_table_name: "t".to_string(),
            stream: true,
            ..OutputConfig::default()
        },
        ..PipelineConfig::default()
    };
    let buffer = SharedBuffer::default();
    let mut pipeline = config.build_streaming(buffer.clone()).unwrap();
    pipeline.add_rows(rows(json!([{"a": 1}, {"a": "x'y"}]))).unwrap();
    pipeline.finish(&mut std::io::sink()).unwrap();

    let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert_eq!(written, "INSERT INTO t (a) VALUES\n(1)\n, ('x''y')\n;\n");
}

#[test]
fn test_multiple_files_from_template() {
    let dir = tempfile::tempdir().unwrap();
    let template = format!("{}/row-{{{{.id}}}}.json", dir.path().display());
    let config = PipelineConfig {
        output: OutputConfig {
            format: OutputFormat::Json,
            output_multiple_files: true,
            output_file_template: Some(template),
            ..OutputConfig::default()
        },
        ..PipelineConfig::default()
    };
    let out = run(&config, json!([{"id": "a"}, {"id": "b"}]));

    let first = dir.path().join("row-a.json");
    let second = dir.path().join("row-b.json");
    assert_eq!(
        out,
        format!(
            "Wrote output to {}\nWrote output to {}\n",
            first.display(),
            second.display()
        )
    );
    let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&second).unwrap()).unwrap();
    assert_eq!(parsed, json!([{"id": "b"}]));
}

#[test]
fn test_errors_name_the_stage() {
    let config = PipelineConfig {
        field_queries: [("a".to_string(), ".b[]".to_string())]
            .into_iter()
            .collect(),
        output: output(OutputFormat::Json),
        ..PipelineConfig::default()
    };
    let mut pipeline = config.build().unwrap();
    let err = pipeline
        .add_row(Row::from_value(json!({"a": {"b": 1}})).unwrap())
        .unwrap_err();
    assert!(err.to_string().starts_with("row middleware 'field-query': "));
    assert!(matches!(err.root(), Error::Query { .. }));
}

#[test]
fn test_cancellation() {
    let config = PipelineConfig {
        output: output(OutputFormat::Json),
        ..PipelineConfig::default()
    };
    let mut pipeline = config.build().unwrap();
    pipeline.cancel_token().cancel();
    let err = pipeline
        .add_row(Row::from_value(json!({"a": 1})).unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}
