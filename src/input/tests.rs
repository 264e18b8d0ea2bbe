//! Tests for input module

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn as_json(rows: &[crate::model::Row]) -> Value {
    serde_json::to_value(rows).unwrap()
}

// ============================================================================
// InputConfig Tests
// ============================================================================

#[test]
fn test_input_format_default() {
    assert_eq!(InputFormat::default(), InputFormat::Json);
    let config = InputConfig::new(InputFormat::Csv).with_record_path("$.x");
    assert_eq!(config.record_path.as_deref(), Some("$.x"));
}

#[test]
fn test_bad_record_path_fails_at_construction() {
    let err = InputConfig::new(InputFormat::Json)
        .with_record_path("$.[?")
        .reader()
        .err()
        .unwrap();
    assert!(matches!(err, Error::Query { .. }));
}

// ============================================================================
// JSON Tests
// ============================================================================

#[test]
fn test_json_array_and_object() {
    let reader = JsonReader::new(None).unwrap();
    let rows = reader.read(r#"[{"b": 1, "a": 2}, {"c": 3}]"#).unwrap();
    assert_eq!(as_json(&rows), json!([{"b": 1, "a": 2}, {"c": 3}]));
    let keys: Vec<&String> = rows[0].keys().collect();
    assert_eq!(keys, vec!["b", "a"]);

    let rows = reader.read(r#"{"single": true}"#).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(reader.read("  ").unwrap().is_empty());
}

#[test]
fn test_json_record_path() {
    let reader = JsonReader::new(Some("$.data.items")).unwrap();
    let rows = reader
        .read(r#"{"data": {"items": [{"id": 1}, {"id": 2}]}}"#)
        .unwrap();
    assert_eq!(as_json(&rows), json!([{"id": 1}, {"id": 2}]));

    let reader = JsonReader::new(Some("$.data[*].user")).unwrap();
    let rows = reader
        .read(r#"{"data": [{"user": {"n": "a"}}, {"user": {"n": "b"}}]}"#)
        .unwrap();
    assert_eq!(as_json(&rows), json!([{"n": "a"}, {"n": "b"}]));
}

#[test]
fn test_json_rejects_non_objects() {
    let reader = JsonReader::new(None).unwrap();
    assert!(matches!(reader.read("[1, 2]"), Err(Error::Decode { .. })));
    assert!(matches!(reader.read("{oops"), Err(Error::Decode { .. })));
}

// ============================================================================
// JSONL Tests
// ============================================================================

#[test]
fn test_jsonl() {
    let rows = JsonlReader::new()
        .read("{\"a\": 1}\n\n{\"a\": 2}\n")
        .unwrap();
    assert_eq!(as_json(&rows), json!([{"a": 1}, {"a": 2}]));

    let err = JsonlReader::new().read("{\"a\": 1}\nnope\n").unwrap_err();
    assert!(err.to_string().contains("line 2"));
}

// ============================================================================
// YAML Tests
// ============================================================================

#[test]
fn test_yaml_documents() {
    let reader = YamlReader::new(None).unwrap();
    let rows = reader
        .read("- name: a\n  n: 1\n- name: b\n---\nname: c\n")
        .unwrap();
    assert_eq!(
        as_json(&rows),
        json!([{"name": "a", "n": 1}, {"name": "b"}, {"name": "c"}])
    );
}

#[test]
fn test_yaml_record_path() {
    let reader = YamlReader::new(Some("$.people")).unwrap();
    let rows = reader.read("people:\n  - id: 1\n  - id: 2\n").unwrap();
    assert_eq!(as_json(&rows), json!([{"id": 1}, {"id": 2}]));
}

// ============================================================================
// CSV Tests
// ============================================================================

#[test]
fn test_csv_typed_cells() {
    let rows = CsvReader::default()
        .read("name,age,score,active,note\nann,30,1.5,true,\n\"b, c\",x,,False,hi\n")
        .unwrap();
    assert_eq!(
        as_json(&rows),
        json!([
            {"name": "ann", "age": 30, "score": 1.5, "active": true, "note": null},
            {"name": "b, c", "age": "x", "score": null, "active": false, "note": "hi"}
        ])
    );
}

#[test]
fn test_tsv_short_rows() {
    let reader = InputConfig::new(InputFormat::Tsv).reader().unwrap();
    let rows = reader.read("a\tb\n1\n").unwrap();
    assert_eq!(as_json(&rows), json!([{"a": 1, "b": null}]));
}

#[test]
fn test_parse_cell() {
    assert_eq!(parse_cell("42"), json!(42));
    assert_eq!(parse_cell("-1.25"), json!(-1.25));
    assert_eq!(parse_cell("TRUE"), json!(true));
    assert_eq!(parse_cell("NaN"), json!("NaN"));
    assert_eq!(parse_cell("0"), json!(0));
    assert_eq!(parse_cell(""), Value::Null);
}
