//! Tests for the record and table model

use super::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn keys(row: &Row) -> Vec<&str> {
    row.keys().map(String::as_str).collect()
}

// ============================================================================
// Row Tests
// ============================================================================

#[test]
fn test_row_preserves_insertion_order() {
    let row = Row::from_pairs([("z", json!(1)), ("a", json!(2)), ("m", json!(3))]);
    assert_eq!(keys(&row), vec!["z", "a", "m"]);
}

#[test]
fn test_row_set_existing_keeps_position() {
    let mut row = Row::from_pairs([("a", 1), ("b", 2), ("c", 3)]);
    row.set("a", 10);
    row.set("d", 4);
    assert_eq!(keys(&row), vec!["a", "b", "c", "d"]);
    assert_eq!(row.get("a"), Some(&json!(10)));
}

#[test]
fn test_row_absent_vs_null() {
    let row = Row::from_pairs([("a", Value::Null)]);
    assert_eq!(row.get("a"), Some(&Value::Null));
    assert_eq!(row.get("b"), None);
    assert!(row.contains_key("a"));
    assert!(!row.contains_key("b"));
}

#[test]
fn test_row_remove_keeps_order() {
    let mut row = Row::from_pairs([("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
    assert_eq!(row.remove("b"), Some(json!(2)));
    assert_eq!(row.remove("x"), None);
    assert_eq!(keys(&row), vec!["a", "c", "d"]);
    row.set("b", 5);
    assert_eq!(row.remove("a"), Some(json!(1)));
    assert_eq!(keys(&row), vec!["c", "d", "b"]);
}

#[test]
fn test_row_from_value_rejects_non_object() {
    assert!(Row::from_value(json!({"a": 1})).is_ok());
    assert!(Row::from_value(json!([1, 2])).is_err());
}

#[test]
fn test_row_serializes_in_order() {
    let row = Row::from_pairs([("b", json!(1)), ("a", json!({"y": 1, "x": 2}))]);
    assert_eq!(
        serde_json::to_string(&row).unwrap(),
        r#"{"b":1,"a":{"y":1,"x":2}}"#
    );
}

#[test]
fn test_value_to_string() {
    assert_eq!(value_to_string(&json!("s")), "s");
    assert_eq!(value_to_string(&json!(12)), "12");
    assert_eq!(value_to_string(&json!(1.5)), "1.5");
    assert_eq!(value_to_string(&json!(true)), "true");
    assert_eq!(value_to_string(&Value::Null), "");
    assert_eq!(value_to_string(&json!(["a", 1, true])), "a, 1, true");
    assert_eq!(value_to_string(&json!({"k": "v"})), r#"{"k":"v"}"#);
}

// ============================================================================
// Table Tests
// ============================================================================

#[test]
fn test_table_finalize_unions_columns_in_first_seen_order() {
    let mut table = Table::new();
    table.add_row(Row::from_pairs([("a", 1), ("b", 2)]));
    table.add_row(Row::from_pairs([("c", 3), ("a", 4)]));
    table.add_row(Row::from_pairs([("d", 5), ("b", 6)]));
    table.finalize();
    assert_eq!(table.columns(), ["a", "b", "c", "d"]);
    assert!(table.is_finalized());
}

#[test]
fn test_table_finalize_idempotent() {
    let mut table = Table::from_rows(vec![Row::from_pairs([("a", 1)])]);
    table.finalize();
    table.finalize();
    assert_eq!(table.columns(), ["a"]);
}

#[test]
fn test_table_finalize_keeps_existing_columns_first() {
    let mut table = Table::new();
    table.set_column_order(&["x".to_string()]);
    table.add_row(Row::from_pairs([("a", 1), ("x", 2)]));
    table.finalize();
    assert_eq!(table.columns(), ["x", "a"]);
}

#[test]
fn test_table_add_after_finalize_extends_columns() {
    let mut table = Table::from_rows(vec![Row::from_pairs([("a", 1)])]);
    table.finalize();
    table.add_row(Row::from_pairs([("b", 2)]));
    assert!(!table.is_finalized());
    table.finalize();
    assert_eq!(table.columns(), ["a", "b"]);
}

#[test]
fn test_set_column_order_retains_unknown_names() {
    let mut table = Table::from_rows(vec![Row::from_pairs([("a", 1), ("b", 2), ("c", 3)])]);
    table.finalize();
    table.set_column_order(&["c".to_string(), "zz".to_string(), "c".to_string()]);
    assert_eq!(table.columns(), ["c", "zz", "a", "b"]);
}
