//! Tests for middleware module

use super::*;
use crate::error::Error;
use crate::model::{Row, Table};
use crate::output::{JsonRowFormatter, SqlFormatter};
use crate::types::CancelToken;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use test_case::test_case;

fn row(value: Value) -> Row {
    Row::from_value(value).unwrap()
}

fn keys(row: &Row) -> Vec<&str> {
    row.keys().map(String::as_str).collect()
}

fn run(mw: &mut dyn RowMiddleware, value: Value) -> Vec<Row> {
    mw.process(&CancelToken::new(), row(value)).unwrap()
}

fn run_one(mw: &mut dyn RowMiddleware, value: Value) -> Row {
    let mut out = run(mw, value);
    assert_eq!(out.len(), 1);
    out.remove(0)
}

fn as_json(rows: &[Row]) -> Value {
    serde_json::to_value(rows).unwrap()
}

// ============================================================================
// Flatten Tests
// ============================================================================

#[test]
fn test_flatten_nested() {
    let out = run_one(
        &mut FlattenMiddleware::new(),
        json!({"a": 1, "b": {"c": 2, "d": {"e": 3}}, "f": [1, {"g": 2}]}),
    );
    assert_eq!(keys(&out), vec!["a", "b.c", "b.d.e", "f"]);
    assert_eq!(out.get("b.d.e"), Some(&json!(3)));
    assert_eq!(out.get("f"), Some(&json!([1, {"g": 2}])));
}

#[test]
fn test_flatten_custom_separator() {
    let out = run_one(
        &mut FlattenMiddleware::new().with_separator("_"),
        json!({"a": {"b": 1}}),
    );
    assert_eq!(keys(&out), vec!["a_b"]);
}

#[test]
fn test_flatten_keeps_all_leaves() {
    let input = json!({"x": {"y": null, "z": "s"}, "w": true});
    let out = run_one(&mut FlattenMiddleware::new(), input);
    let leaves: Vec<&Value> = out.iter().map(|(_, v)| v).collect();
    assert_eq!(leaves, vec![&Value::Null, &json!("s"), &json!(true)]);
}

// ============================================================================
// Fields Filter Tests
// ============================================================================

#[test]
fn test_fields_filter_drop_exact() {
    let mut mw = FieldsFilterMiddleware::new(&[] as &[&str], &["b.c"]);
    let out = run_one(&mut mw, json!({"a": 1, "b.c": 2, "b.d": 3}));
    assert_eq!(keys(&out), vec!["a", "b.d"]);
}

#[test]
fn test_fields_filter_keep_prefix() {
    let mut mw = FieldsFilterMiddleware::new(&["b."], &[]);
    let out = run_one(&mut mw, json!({"a": 1, "b.c": 2, "b.d": 3}));
    assert_eq!(keys(&out), vec!["b.c", "b.d"]);
}

#[test]
fn test_fields_filter_precedence() {
    let mut mw = FieldsFilterMiddleware::new(&["a", "b."], &["a", "b.x", "c."]);
    assert!(mw.includes("a"));
    assert!(!mw.includes("b.x"));
    assert!(mw.includes("b.y"));
    assert!(!mw.includes("c.z"));
    assert!(!mw.includes("other"));
}

#[test]
fn test_fields_filter_prefix_keep_beats_prefix_drop() {
    let mut mw = FieldsFilterMiddleware::new(&["b."], &["b."]);
    assert!(mw.includes("b.c"));
}

#[test]
fn test_fields_filter_regex() {
    let mut mw = FieldsFilterMiddleware::new(&[] as &[&str], &[])
        .with_regex_fields(&["^id_"])
        .unwrap()
        .with_regex_filters(&["_tmp$"])
        .unwrap();
    let out = run_one(&mut mw, json!({"id_a": 1, "id_tmp": 2, "name": 3}));
    assert_eq!(keys(&out), vec!["id_a", "id_tmp"]);

    let err = FieldsFilterMiddleware::new(&[] as &[&str], &[])
        .with_regex_fields(&["("])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRegex { .. }));
}

#[test]
fn test_fields_filter_idempotent() {
    let mut mw = FieldsFilterMiddleware::new(&["a", "c."], &["c.x"]);
    let once = run_one(&mut mw, json!({"a": 1, "b": 2, "c.x": 3, "c.y": 4}));
    let twice = mw.process(&CancelToken::new(), once.clone()).unwrap();
    assert_eq!(twice, vec![once]);
}

#[test]
fn test_fields_filter_passthrough_without_rules() {
    let mut mw = FieldsFilterMiddleware::new(&[] as &[&str], &[]);
    let out = run_one(&mut mw, json!({"z": 1, "a": 2}));
    assert_eq!(keys(&out), vec!["z", "a"]);
}

// ============================================================================
// Rename Tests
// ============================================================================

#[test]
fn test_rename_exact_then_regex() {
    let mut mw = RenameColumnsMiddleware::new(
        HashMap::from([("foo".to_string(), "bar".to_string())]),
        vec![RegexRename::new("^foo(.*)$", "bar$1").unwrap()],
    );
    let out = run_one(&mut mw, json!({"foo": 1, "baz": 2, "foobar": 3}));
    assert_eq!(keys(&out), vec!["bar", "baz", "barbar"]);
}

#[test]
fn test_rename_collision_keeps_first_position_last_value() {
    let mut mw = RenameColumnsMiddleware::new(
        HashMap::from([("b".to_string(), "a".to_string())]),
        vec![],
    );
    let out = run_one(&mut mw, json!({"a": 1, "c": 2, "b": 3}));
    assert_eq!(keys(&out), vec!["a", "c"]);
    assert_eq!(out.get("a"), Some(&json!(3)));
}

#[test]
fn test_rename_idempotent() {
    let mut mw = RenameColumnsMiddleware::new(
        HashMap::from([("x".to_string(), "y".to_string())]),
        vec![],
    );
    assert_eq!(mw.rename("x"), "y");
    assert_eq!(mw.rename("y"), "y");
}

#[test]
fn test_rename_from_yaml_list_and_mapping() {
    let mut mw = RenameColumnsMiddleware::from_yaml(
        "renames:\n  a: b\nregexpRenames:\n  - \"^x_(.*)\": \"$1\"\n  - \"^y\": \"z\"\n",
    )
    .unwrap();
    assert_eq!(mw.rename("a"), "b");
    assert_eq!(mw.rename("x_id"), "id");
    assert_eq!(mw.rename("yes"), "zes");

    let mut mw =
        RenameColumnsMiddleware::from_yaml("regexpRenames:\n  \"^a\": \"b\"\n").unwrap();
    assert_eq!(mw.rename("abc"), "bbc");

    assert!(RenameColumnsMiddleware::from_yaml("regexpRenames:\n  \"(\": x\n").is_err());
    assert!(RenameColumnsMiddleware::from_yaml("- a\n").is_err());
}

// ============================================================================
// Replace Tests
// ============================================================================

#[test]
fn test_replace_from_yaml() {
    let mut mw = ReplaceMiddleware::from_yaml(
        r#"
name:
  replace:
    - "foo": "bar"
  regex_replace:
    - "^b(.*)": "B$1"
  skip: ["secret"]
status:
  regex_skip: ["^tmp-"]
"#,
    )
    .unwrap();

    let out = run_one(&mut mw, json!({"name": "foo-foo", "n": 1}));
    assert_eq!(out.get("name"), Some(&json!("Bar-bar")));
    assert!(run(&mut mw, json!({"name": "top secret"})).is_empty());
    assert!(run(&mut mw, json!({"status": "tmp-1"})).is_empty());
    assert_eq!(run(&mut mw, json!({"status": "ok"})).len(), 1);
}

#[test]
fn test_replace_ignores_non_strings() {
    let mut rules = FieldReplacements::default();
    rules.skip.push("1".to_string());
    let mut mw = ReplaceMiddleware::new(HashMap::from([("n".to_string(), rules)]));
    assert_eq!(run(&mut mw, json!({"n": 1})).len(), 1);
}

#[test]
fn test_replace_rejects_unknown_rule() {
    let err = ReplaceMiddleware::from_yaml("name:\n  swap: []\n").unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
}

// ============================================================================
// Reorder / Sort / Nulls / Add Tests
// ============================================================================

#[test]
fn test_reorder_with_prefix() {
    let mut mw = ReorderColumnsMiddleware::new(["c", "b.", "missing"]);
    let out = run_one(&mut mw, json!({"a": 1, "b.y": 2, "c": 3, "b.x": 4}));
    assert_eq!(keys(&out), vec!["c", "b.y", "b.x", "a"]);
}

#[test]
fn test_sort_columns() {
    let out = run_one(&mut SortColumnsMiddleware::new(), json!({"b": 1, "c": 2, "a": 3}));
    assert_eq!(keys(&out), vec!["a", "b", "c"]);
}

#[test]
fn test_remove_nulls() {
    let out = run_one(&mut RemoveNullsMiddleware::new(), json!({"a": null, "b": 0, "c": ""}));
    assert_eq!(keys(&out), vec!["b", "c"]);
}

#[test]
fn test_add_fields() {
    let mut mw = AddFieldsMiddleware::new([("source", json!("api")), ("a", json!(9))]);
    let out = run_one(&mut mw, json!({"a": 1, "b": 2}));
    assert_eq!(keys(&out), vec!["a", "b", "source"]);
    assert_eq!(out.get("a"), Some(&json!(9)));
}

// ============================================================================
// Skip / Limit / Remove Duplicates Tests
// ============================================================================

#[test_case(0, 0, 5, 5 ; "no bounds")]
#[test_case(2, 0, 5, 3 ; "skip only")]
#[test_case(0, 2, 5, 2 ; "limit only")]
#[test_case(1, 2, 5, 2 ; "skip and limit")]
#[test_case(4, 3, 5, 1 ; "limit past end")]
#[test_case(7, 1, 5, 0 ; "skip past end")]
#[test_case(-3, -1, 5, 5 ; "negative treated as unset")]
fn test_skip_limit(skip: i64, limit: i64, total: usize, expected: usize) {
    let mut mw = SkipLimitMiddleware::new(skip, limit);
    let emitted: usize = (0..total).map(|i| run(&mut mw, json!({"i": i})).len()).sum();
    assert_eq!(emitted, expected);
}

#[test]
fn test_skip_limit_emits_the_right_rows() {
    let mut mw = SkipLimitMiddleware::new(1, 2);
    let out: Vec<Row> = (0..5).flat_map(|i| run(&mut mw, json!({"i": i}))).collect();
    assert_eq!(as_json(&out), json!([{"i": 1}, {"i": 2}]));
}

#[test]
fn test_remove_duplicates_adjacent_only() {
    let mut mw = RemoveDuplicatesMiddleware::new(["a", "b"]);
    let input = [
        json!({"a": 1, "b": 2, "c": 3}),
        json!({"a": 1, "b": 2, "c": 4}),
        json!({"a": 4, "b": 5, "c": 6}),
        json!({"a": 1, "b": 2, "c": 7}),
    ];
    let out: Vec<Row> = input.into_iter().flat_map(|v| run(&mut mw, v)).collect();
    assert_eq!(
        as_json(&out),
        json!([{"a": 1, "b": 2, "c": 3}, {"a": 4, "b": 5, "c": 6}, {"a": 1, "b": 2, "c": 7}])
    );
}

#[test]
fn test_remove_duplicates_needs_present_keys() {
    let mut mw = RemoveDuplicatesMiddleware::new(["a"]);
    assert_eq!(run(&mut mw, json!({"b": 1})).len(), 1);
    assert_eq!(run(&mut mw, json!({"b": 2})).len(), 1);
    assert_eq!(run(&mut mw, json!({"a": null})).len(), 1);
    assert_eq!(run(&mut mw, json!({"a": null})).len(), 0);
    assert_eq!(run(&mut mw, json!({"c": 1})).len(), 1);
}

#[test]
fn test_remove_duplicates_partial_keys_differ() {
    let mut mw = RemoveDuplicatesMiddleware::new(["a", "b"]);
    assert_eq!(run(&mut mw, json!({"a": 1})).len(), 1);
    assert_eq!(run(&mut mw, json!({"a": 1})).len(), 1);
    assert_eq!(run(&mut mw, json!({"a": 1, "b": 2})).len(), 1);
    assert_eq!(run(&mut mw, json!({"a": 1, "b": 2, "c": 3})).len(), 0);
}

// ============================================================================
// Template Fields Tests
// ============================================================================

#[test]
fn test_template_fields_with_rename_separator() {
    let mut mw = TemplateFieldsMiddleware::new([
        ("b.d", "{{.a}}-{{.b_d}}"),
        ("a", "{{.a}}-{{.b_d}}"),
    ])
    .unwrap()
    .with_rename_separator("_");
    let out = run_one(&mut mw, json!({"b.d": "v2", "a": "v1"}));
    assert_eq!(serde_json::to_value(&out).unwrap(), json!({"b.d": "v1-v2", "a": "v1-v2"}));
    assert_eq!(keys(&out), vec!["b.d", "a"]);
}

#[test]
fn test_template_fields_row_alias_and_new_field() {
    let mut mw = TemplateFieldsMiddleware::new([("label", "{{index ._row \"x\" | upper}}")]).unwrap();
    let out = run_one(&mut mw, json!({"x": "hi"}));
    assert_eq!(keys(&out), vec!["x", "label"]);
    assert_eq!(out.get("label"), Some(&json!("HI")));
}

#[test]
fn test_template_fields_parse_error_at_construction() {
    let err = TemplateFieldsMiddleware::new([("x", "{{ if .a }}")]).unwrap_err();
    assert!(err.is_config_error());
}

// ============================================================================
// Query Tests
// ============================================================================

#[test]
fn test_object_query_spreads_matches() {
    let mut mw = ObjectQueryMiddleware::new(".items[]").unwrap();
    let out = run(&mut mw, json!({"items": [{"id": 1}, {"id": 2}]}));
    assert_eq!(as_json(&out), json!([{"id": 1}, {"id": 2}]));

    let mut mw = ObjectQueryMiddleware::new(".items").unwrap();
    let out = run(&mut mw, json!({"items": [{"id": 1}, {"id": 2}]}));
    assert_eq!(as_json(&out), json!([{"id": 1}, {"id": 2}]));
}

#[test]
fn test_object_query_builds_objects() {
    let mut mw = ObjectQueryMiddleware::new("{x: .a, n: (.b | length)}").unwrap();
    let out = run(&mut mw, json!({"a": 1, "b": [1, 2]}));
    assert_eq!(as_json(&out), json!([{"x": 1, "n": 2}]));

    let mut mw = ObjectQueryMiddleware::new(".items[] | select(.ok) | {id}").unwrap();
    let out = run(
        &mut mw,
        json!({"items": [{"id": 1, "ok": true}, {"id": 2, "ok": false}]}),
    );
    assert_eq!(as_json(&out), json!([{"id": 1}]));
}

#[test]
fn test_object_query_can_drop_rows() {
    let mut mw = ObjectQueryMiddleware::new("select(.keep)").unwrap();
    assert!(run(&mut mw, json!({"keep": false})).is_empty());
    assert_eq!(run(&mut mw, json!({"keep": true})).len(), 1);
}

#[test]
fn test_object_query_rejects_scalars() {
    let mut mw = ObjectQueryMiddleware::new(".n").unwrap();
    let err = mw
        .process(&CancelToken::new(), row(json!({"n": 3})))
        .unwrap_err();
    assert!(matches!(err, Error::Query { .. }));
}

#[test]
fn test_object_query_invalid_query() {
    assert!(matches!(
        ObjectQueryMiddleware::new(".[ | "),
        Err(Error::Query { .. })
    ));
    assert!(matches!(
        ObjectQueryMiddleware::new("$.items[*]"),
        Err(Error::Query { .. })
    ));
}

#[test]
fn test_field_query_replaces_value() {
    let queries = HashMap::from([("user".to_string(), ".name".to_string())]);
    let mut mw = FieldQueryMiddleware::new(&queries).unwrap();
    let out = run_one(&mut mw, json!({"id": 1, "user": {"name": "ada", "age": 36}}));
    assert_eq!(serde_json::to_value(&out).unwrap(), json!({"id": 1, "user": "ada"}));

    let out = run_one(&mut mw, json!({"id": 2}));
    assert_eq!(keys(&out), vec!["id"]);
}

#[test]
fn test_field_query_takes_first_output() {
    let queries = HashMap::from([("tags".to_string(), ".[] | ascii_upcase".to_string())]);
    let mut mw = FieldQueryMiddleware::new(&queries).unwrap();
    let out = run_one(&mut mw, json!({"tags": ["a", "b"]}));
    assert_eq!(serde_json::to_value(&out).unwrap(), json!({"tags": "A"}));
}

#[test]
fn test_field_query_without_output_is_error() {
    let queries = HashMap::from([("user".to_string(), ".tags[]".to_string())]);
    let mut mw = FieldQueryMiddleware::new(&queries).unwrap();
    let err = mw
        .process(&CancelToken::new(), row(json!({"user": {"tags": []}})))
        .unwrap_err();
    assert!(matches!(err, Error::Query { .. }));

    let err = mw
        .process(&CancelToken::new(), row(json!({"user": {"tags": 3}})))
        .unwrap_err();
    assert!(err.to_string().contains("Cannot iterate over number"));
}

// ============================================================================
// Table Middleware Tests
// ============================================================================

fn table(value: Value) -> Table {
    let rows = value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| row(v.clone()))
        .collect();
    let mut table = Table::from_rows(rows);
    table.finalize();
    table
}

#[test]
fn test_sort_by_descending() {
    let mut mw = SortByMiddleware::new(&["-a"]);
    let out = mw
        .process(
            &CancelToken::new(),
            table(json!([{"a": 1, "b": 2}, {"a": 3, "b": 1}, {"a": 2, "b": 9}])),
        )
        .unwrap();
    assert_eq!(
        as_json(out.rows()),
        json!([{"a": 3, "b": 1}, {"a": 2, "b": 9}, {"a": 1, "b": 2}])
    );
}

#[test]
fn test_sort_by_multiple_keys_stable() {
    let mut mw = SortByMiddleware::new(&["g", "-n", ""]);
    assert_eq!(mw.keys().len(), 2);
    let out = mw
        .process(
            &CancelToken::new(),
            table(json!([
                {"g": "b", "n": 1, "id": 1},
                {"g": "a", "n": 1, "id": 2},
                {"g": "a", "n": 2, "id": 3},
                {"g": "a", "n": 2, "id": 5}
            ])),
        )
        .unwrap();
    let ids: Vec<&Value> = out.rows().iter().map(|r| r.get("id").unwrap()).collect();
    assert_eq!(ids, vec![&json!(3), &json!(5), &json!(2), &json!(1)]);
}

#[test]
fn test_compare_values_mixed_types_are_equal() {
    use std::cmp::Ordering;
    assert_eq!(compare_values(Some(&json!(1)), Some(&json!(2.5))), Ordering::Less);
    assert_eq!(compare_values(Some(&json!("b")), Some(&json!("a"))), Ordering::Greater);
    assert_eq!(compare_values(Some(&json!(1)), Some(&json!("a"))), Ordering::Equal);
    assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Equal);
}

#[test]
fn test_column_order_forces_leading_columns() {
    let mut mw = ColumnOrderMiddleware::new(["c", "a"]);
    let out = mw
        .process(&CancelToken::new(), table(json!([{"a": 1, "b": 2, "c": 3}])))
        .unwrap();
    assert_eq!(out.columns(), &["c", "a", "b"]);
}

// ============================================================================
// Output Middleware Tests
// ============================================================================

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

#[test]
fn test_output_middleware_streams_and_passes_rows() {
    let buffer = SharedBuffer::default();
    let mut mw = OutputMiddleware::new(JsonRowFormatter::lines(), buffer.clone());
    let out = run(&mut mw, json!({"a": 1}));
    assert_eq!(out.len(), 1);
    assert_eq!(buffer.contents(), "{\"a\":1}\n");
}

#[test]
fn test_output_middleware_close_writes_trailer() {
    let buffer = SharedBuffer::default();
    let mut mw = OutputMiddleware::new(SqlFormatter::new("t"), buffer.clone());
    run(&mut mw, json!({"a": 1}));
    run(&mut mw, json!({"a": 2}));
    mw.close(&CancelToken::new()).unwrap();
    assert_eq!(buffer.contents(), "INSERT INTO t (a) VALUES\n(1)\n, (2)\n;\n");
}
