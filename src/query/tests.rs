//! Tests for query module

use super::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

fn run(query: &str, input: Value) -> Vec<Value> {
    Query::compile(query).unwrap().run(&input).unwrap()
}

fn query_error(query: &str, input: Value) -> String {
    let err = Query::compile(query)
        .and_then(|q| q.run(&input))
        .unwrap_err();
    let Error::Query { query: source, message } = err else {
        panic!("expected a query error for {query}");
    };
    assert_eq!(source, query);
    message
}

// ============================================================================
// Path Tests
// ============================================================================

#[test_case(".a", json!({"a": 1}), json!([1]) ; "field")]
#[test_case(".a.b", json!({"a": {"b": "x"}}), json!(["x"]) ; "nested field")]
#[test_case(".missing", json!({"a": 1}), json!([null]) ; "missing field is null")]
#[test_case(".\"a b\"", json!({"a b": 1}), json!([1]) ; "quoted field")]
#[test_case(".[1]", json!([1, 2, 3]), json!([2]) ; "index")]
#[test_case(".[-1]", json!([1, 2, 3]), json!([3]) ; "negative index")]
#[test_case(".[1:]", json!([1, 2, 3]), json!([[2, 3]]) ; "slice")]
#[test_case(".items[]", json!({"items": [1, 2]}), json!([1, 2]) ; "iterate")]
#[test_case(".[]?", json!(3), json!([]) ; "optional iterate")]
#[test_case("..", json!({"a": [1]}), json!([{"a": [1]}, [1], 1]) ; "recurse")]
#[test_case("", json!({"a": 1}), json!([{"a": 1}]) ; "empty is identity")]
fn test_paths(query: &str, input: Value, expected: Value) {
    assert_eq!(Value::Array(run(query, input)), expected);
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_object_construction() {
    assert_eq!(
        run(
            "{id, name: .user.name}",
            json!({"id": 1, "user": {"name": "ada"}, "x": 0})
        ),
        vec![json!({"id": 1, "name": "ada"})]
    );
    assert_eq!(run("{x: .a}", json!({"a": 5})), vec![json!({"x": 5})]);
    assert_eq!(
        run("{(.k): .v}", json!({"k": "name", "v": 3})),
        vec![json!({"name": 3})]
    );
    assert_eq!(run("1 as $x | {$x}", json!(null)), vec![json!({"x": 1})]);
}

#[test]
fn test_object_construction_is_cartesian() {
    assert_eq!(
        run("{a: (1, 2)}", json!(null)),
        vec![json!({"a": 1}), json!({"a": 2})]
    );
}

#[test]
fn test_array_construction_and_interpolation() {
    assert_eq!(run("[.[] | . * 2]", json!([1, 2])), vec![json!([2, 4])]);
    assert_eq!(run(r#""id-\(.id)""#, json!({"id": 3})), vec![json!("id-3")]);
}

// ============================================================================
// Operator Tests
// ============================================================================

#[test_case("1 + 2 * 3", json!(7) ; "precedence")]
#[test_case("10 / 4", json!(2.5) ; "division")]
#[test_case("7 % 3", json!(1) ; "remainder")]
#[test_case("\"a\" + \"b\"", json!("ab") ; "string concat")]
#[test_case("{\"a\": 1} + {\"b\": 2}", json!({"a": 1, "b": 2}) ; "object merge")]
#[test_case("null + 1", json!(1) ; "null is additive identity")]
#[test_case("[1, 2, 3] - [2]", json!([1, 3]) ; "array difference")]
#[test_case("1 == 1.0", json!(true) ; "numeric equality")]
#[test_case("[null, true, false, 1, \"a\", [], {}] | sort", json!([null, false, true, 1, "a", [], {}]) ; "type order")]
fn test_operators(query: &str, expected: Value) {
    assert_eq!(run(query, json!(null)), vec![expected]);
}

#[test]
fn test_binary_outputs_are_cartesian() {
    assert_eq!(
        run("(1, 2) + (10, 20)", json!(null)),
        vec![json!(11), json!(12), json!(21), json!(22)]
    );
}

#[test]
fn test_alternative_and_comma() {
    assert_eq!(run(".a // \"d\"", json!({"a": null})), vec![json!("d")]);
    assert_eq!(run(".a // \"d\"", json!({"a": false})), vec![json!("d")]);
    assert_eq!(run(".a // \"d\"", json!({"a": 0})), vec![json!(0)]);
    assert_eq!(run(".a, .b", json!({"a": 1, "b": 2})), vec![json!(1), json!(2)]);
}

#[test]
fn test_select_and_map() {
    let rows = json!([{"id": "a", "n": 1}, {"id": "b", "n": 2}]);
    assert_eq!(run(".[] | select(.n > 1) | .id", rows.clone()), vec![json!("b")]);
    assert_eq!(run("map(.n) | add", rows), vec![json!(3)]);
}

// ============================================================================
// Control Flow Tests
// ============================================================================

#[test]
fn test_if_try_reduce() {
    let q = "if .a then \"y\" elif .b then \"z\" else \"n\" end";
    assert_eq!(run(q, json!({"b": 1})), vec![json!("z")]);
    assert_eq!(run(q, json!({})), vec![json!("n")]);
    assert_eq!(run("if . then 1 end", json!(false)), vec![json!(false)]);
    assert_eq!(
        run("try error(\"boom\") catch .", json!(null)),
        vec![json!("boom")]
    );
    assert_eq!(
        run("reduce .[] as $x (0; . + $x)", json!([1, 2, 3])),
        vec![json!(6)]
    );
}

// ============================================================================
// Update Tests
// ============================================================================

#[test]
fn test_assignment() {
    assert_eq!(run(".a = 1", json!({"b": 2})), vec![json!({"b": 2, "a": 1})]);
    assert_eq!(run(".a |= . + 1", json!({"a": 1})), vec![json!({"a": 2})]);
    assert_eq!(
        run(".items[].n += 10", json!({"items": [{"n": 1}, {"n": 2}]})),
        vec![json!({"items": [{"n": 11}, {"n": 12}]})]
    );
    assert_eq!(run(".x //= \"d\"", json!({})), vec![json!({"x": "d"})]);
}

#[test]
fn test_delete() {
    assert_eq!(
        run("del(.a, .c)", json!({"a": 1, "b": 2, "c": 3})),
        vec![json!({"b": 2})]
    );
    assert_eq!(run("del(.[0, 2])", json!([1, 2, 3])), vec![json!([2])]);
}

// ============================================================================
// Builtin Tests
// ============================================================================

#[test_case("keys", json!({"b": 1, "a": 2}), json!(["a", "b"]) ; "keys are sorted")]
#[test_case("to_entries", json!({"a": 1}), json!([{"key": "a", "value": 1}]) ; "to_entries")]
#[test_case("with_entries(.value += 1)", json!({"a": 1}), json!({"a": 2}) ; "with_entries")]
#[test_case("length", json!("héllo"), json!(5) ; "string length counts chars")]
#[test_case("split(\",\") | join(\"-\")", json!("a,b"), json!("a-b") ; "split and join")]
#[test_case("test(\"^a.c$\")", json!("abc"), json!(true) ; "regex test")]
#[test_case("group_by(.k) | map(length)", json!([{"k": 1}, {"k": 2}, {"k": 1}]), json!([2, 1]) ; "group_by")]
#[test_case("unique", json!([3, 1, 3]), json!([1, 3]) ; "unique")]
#[test_case("[paths]", json!({"a": [1]}), json!([["a"], ["a", 0]]) ; "paths")]
#[test_case("[limit(2; .[])]", json!([1, 2, 3]), json!([1, 2]) ; "limit")]
#[test_case("tostring", json!({"a": 1}), json!("{\"a\":1}") ; "tostring")]
#[test_case("tonumber", json!("1.5"), json!(1.5) ; "tonumber")]
#[test_case("[range(3)]", json!(null), json!([0, 1, 2]) ; "range")]
fn test_builtins(query: &str, input: Value, expected: Value) {
    assert_eq!(run(query, input), vec![expected]);
}

#[test]
fn test_first_output() {
    let q = Query::compile(".[]").unwrap();
    assert_eq!(q.first(&json!([4, 5])).unwrap(), Some(json!(4)));
    assert_eq!(q.first(&json!([])).unwrap(), None);
    assert_eq!(q.source(), ".[]");
}

// ============================================================================
// Error Tests
// ============================================================================

#[test_case(".a |", "syntax error" ; "dangling pipe")]
#[test_case(".[", "syntax error" ; "open bracket")]
#[test_case("{(.a)}", "computed key" ; "computed key without value")]
#[test_case("nosuch(1)", "nosuch/1 is not defined" ; "unknown function")]
#[test_case("$x", "$x is not defined" ; "unbound variable")]
fn test_compile_errors(query: &str, expected: &str) {
    let Err(Error::Query { message, .. }) = Query::compile(query) else {
        panic!("expected a compile error for {query}");
    };
    assert!(message.contains(expected), "{message}");
}

#[test]
fn test_runtime_errors() {
    assert_eq!(query_error(".[]", json!(3)), "Cannot iterate over number");
    assert_eq!(
        query_error(".a", json!([1])),
        "Cannot index array with \"a\""
    );
    assert_eq!(query_error("error(\"custom\")", json!(null)), "custom");
    assert!(query_error("1 / 0", json!(null)).contains("divisor is zero"));
}
