//! Tests for the template engine

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn render_ok(source: &str, data: &JsonValue) -> String {
    Template::parse(source).unwrap().render(data).unwrap()
}

// ============================================================================
// Fields and variables
// ============================================================================

#[test]
fn test_simple_substitution() {
    let out = render_ok("Hello {{ .name }}!", &json!({"name": "World"}));
    assert_eq!(out, "Hello World!");
}

#[test]
fn test_nested_field() {
    let data = json!({"user": {"address": {"city": "Lyon"}}});
    assert_eq!(render_ok("{{ .user.address.city }}", &data), "Lyon");
}

#[test]
fn test_missing_key_renders_empty() {
    assert_eq!(render_ok("[{{ .missing }}]", &json!({})), "[]");
    assert_eq!(render_ok("[{{ .missing.deeper }}]", &json!({})), "[]");
}

#[test]
fn test_missing_key_strict() {
    let tpl = Template::parse("{{ .missing }}").unwrap().with_strict(true);
    let err = tpl.render(&json!({"present": 1})).unwrap_err();
    assert!(matches!(err, Error::UndefinedVariable { ref variable } if variable == ".missing"));
}

#[test]
fn test_field_on_scalar_is_error() {
    let err = Template::parse("{{ .a.b }}")
        .unwrap()
        .render(&json!({"a": 1}))
        .unwrap_err();
    assert!(matches!(err, Error::Template { .. }));
}

#[test]
fn test_null_and_composite_printing() {
    let data = json!({"n": null, "o": {"x": 1}, "l": [1, 2]});
    assert_eq!(render_ok("[{{ .n }}] {{ .o }} {{ .l }}", &data), r#"[] {"x":1} [1,2]"#);
}

#[test]
fn test_variables_and_root() {
    let data = json!({"a": 1});
    assert_eq!(render_ok("{{ $x := .a }}{{ $x }}-{{ $.a }}", &data), "1-1");
}

#[test]
fn test_variable_assignment_inside_range() {
    let data = json!({"l": [5, 6]});
    let out = render_ok("{{ $x := 1 }}{{ range .l }}{{ $x = . }}{{ end }}{{ $x }}", &data);
    assert_eq!(out, "6");
}

#[test]
fn test_undefined_variable() {
    let err = Template::parse("{{ $nope }}")
        .unwrap()
        .render(&json!({}))
        .unwrap_err();
    assert!(matches!(err, Error::UndefinedVariable { .. }));
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_if_else() {
    let tpl = Template::parse("{{ if .ok }}yes{{ else }}no{{ end }}").unwrap();
    assert_eq!(tpl.render(&json!({"ok": true})).unwrap(), "yes");
    assert_eq!(tpl.render(&json!({"ok": false})).unwrap(), "no");
    assert_eq!(tpl.render(&json!({})).unwrap(), "no");
}

#[test_case(1, "one" ; "first branch")]
#[test_case(2, "two" ; "else if branch")]
#[test_case(7, "many" ; "else branch")]
fn test_else_if_chain(n: i64, expected: &str) {
    let tpl =
        Template::parse("{{ if eq .n 1 }}one{{ else if eq .n 2 }}two{{ else }}many{{ end }}")
            .unwrap();
    assert_eq!(tpl.render(&json!({ "n": n })).unwrap(), expected);
}

#[test]
fn test_range_with_index() {
    let data = json!({"items": ["a", "b"]});
    let out = render_ok("{{ range $i, $e := .items }}{{ $i }}={{ $e }};{{ end }}", &data);
    assert_eq!(out, "0=a;1=b;");
}

#[test]
fn test_range_else() {
    let tpl = Template::parse("{{ range .items }}{{ . }}{{ else }}empty{{ end }}").unwrap();
    assert_eq!(tpl.render(&json!({"items": []})).unwrap(), "empty");
    assert_eq!(tpl.render(&json!({})).unwrap(), "empty");
}

#[test]
fn test_range_over_object_keeps_order() {
    let data = json!({"z": 1, "a": 2});
    assert_eq!(
        render_ok("{{ range $k, $v := . }}{{ $k }}:{{ $v }} {{ end }}", &data),
        "z:1 a:2 "
    );
}

#[test]
fn test_range_over_int() {
    assert_eq!(render_ok("{{ range 3 }}{{ . }}{{ end }}", &json!({})), "012");
}

#[test]
fn test_break_and_continue() {
    let tpl = "{{ range . }}{{ if eq . 3 }}{{ break }}{{ end }}\
               {{ if eq . 1 }}{{ continue }}{{ end }}{{ . }}{{ end }}";
    assert_eq!(render_ok(tpl, &json!([0, 1, 2, 3, 4])), "02");
}

#[test]
fn test_with() {
    let tpl = Template::parse("{{ with .user }}{{ .name }}{{ else }}none{{ end }}").unwrap();
    assert_eq!(tpl.render(&json!({"user": {"name": "ann"}})).unwrap(), "ann");
    assert_eq!(tpl.render(&json!({})).unwrap(), "none");
}

#[test]
fn test_trim_markers_and_comments() {
    assert_eq!(render_ok("a  {{- .x -}}  b", &json!({"x": "X"})), "aXb");
    assert_eq!(render_ok("a{{/* hi */}}b", &json!({})), "ab");
    assert_eq!(render_ok("a\n{{- /* hi */ -}}\nb", &json!({})), "ab");
}

// ============================================================================
// Pipelines
// ============================================================================

#[test]
fn test_pipeline() {
    let data = json!({"name": "bob"});
    assert_eq!(render_ok("{{ .name | upper }}", &data), "BOB");
    assert_eq!(render_ok(r#"{{ "hello" | printf "%s!" }}"#, &data), "hello!");
    assert_eq!(render_ok("{{ mul 2 3 | add 1 }}", &data), "7");
}

#[test]
fn test_parenthesized_with_field_chain() {
    let data = json!({"l": [{"name": "x"}, {"name": "y"}]});
    assert_eq!(render_ok("{{ (index .l 1).name }}", &data), "y");
}

#[test]
fn test_split_join() {
    assert_eq!(
        render_ok(r#"{{ split "," "a,b" | join "-" }}"#, &json!({})),
        "a-b"
    );
}

// ============================================================================
// Parse errors
// ============================================================================

#[test_case("{{ if .a }}x" ; "missing end")]
#[test_case("{{ nosuch .a }}" ; "unknown function")]
#[test_case("{{ .a " ; "unclosed action")]
#[test_case("{{ end }}" ; "stray end")]
#[test_case(r#"{{ "abc }}"# ; "unterminated string")]
fn test_parse_errors(source: &str) {
    let err = Template::parse(source).unwrap_err();
    assert!(matches!(err, Error::TemplateParse { .. }), "{err}");
}

// ============================================================================
// Function library
// ============================================================================

#[test_case("{{ add 1 2 }}", "3" ; "add ints")]
#[test_case("{{ div 7 2.0 }}", "3.5" ; "div float")]
#[test_case("{{ sub 10 4 }}", "6" ; "sub ints")]
#[test_case("{{ mod 7 3 }}", "1" ; "modulo")]
#[test_case("{{ currency 5 }}", "5.00" ; "currency int")]
#[test_case("{{ currency 2.5 }}", "2.50" ; "currency float")]
#[test_case(r#"{{ currency "x" }}"#, "" ; "currency other")]
#[test_case(r#"{{ parseInt "42" }}"#, "42" ; "parse int")]
#[test_case(r#"{{ parseInt "nope" }}"#, "0" ; "parse int fallback")]
#[test_case(r#"[{{ padLeft "ab" 5 }}]"#, "[   ab]" ; "pad left")]
#[test_case(r#"[{{ padRight "ab" 5 }}]"#, "[ab   ]" ; "pad right")]
#[test_case(r#"[{{ padCenter "ab" 6 }}]"#, "[  ab  ]" ; "pad center")]
#[test_case(r#"[{{ rpad "ab" 4 }}]"#, "[ab  ]" ; "rpad")]
#[test_case(r#"{{ bold "x" }}"#, "**x**" ; "bold")]
#[test_case(r#"{{ italic "x" }}"#, "*x*" ; "italic")]
#[test_case(r#"{{ strikethrough "x" }}"#, "~~x~~" ; "strikethrough")]
#[test_case(r#"{{ codeBlock "x" "go" }}"#, "```go\nx\n```" ; "code block")]
#[test_case(r#"{{ quote "x" }}"#, "`x`" ; "quote")]
#[test_case(r#"{{ "a\nb" | quoteNewlines }}"#, "a\\nb" ; "quote newlines")]
#[test_case(r#"{{ "a\nb" | stripNewlines }}"#, "a b" ; "strip newlines")]
#[test_case(r#"{{ toDate "2023-01-02T10:00:00Z" }}"#, "2023-01-02" ; "to date")]
#[test_case(r#"{{ formatDate "%d/%m/%Y" "2023-01-02" }}"#, "02/01/2023" ; "format date")]
#[test_case(r#"{{ toUrlParameter (list "a" "b") }}"#, "a,b" ; "url parameter list")]
#[test_case("{{ toUrlParameter 1.5 }}", "1.500000" ; "url parameter float")]
#[test_case(r#"{{ replaceRegexp "foo123" "[0-9]+" "X" }}"#, "fooX" ; "replace regexp")]
#[test_case(r#"{{ replaceRegexp "foo" "(" "X" }}"#, "foo" ; "replace regexp invalid")]
#[test_case(r#"{{ replace "a" "b" "banana" }}"#, "bbnbnb" ; "replace literal")]
#[test_case(r#"{{ title "hello world" }}"#, "Hello World" ; "title")]
#[test_case(r#"{{ trim "  x  " }}"#, "x" ; "trim")]
#[test_case(r#"{{ trimPrefix "-" "-x" }}"#, "x" ; "trim prefix")]
#[test_case(r#"{{ b64enc "hi" }}"#, "aGk=" ; "base64 encode")]
#[test_case(r#"{{ b64dec "aGk=" }}"#, "hi" ; "base64 decode")]
#[test_case(r#"{{ indentBlock 2 "a\nb" }}"#, "  a\n  b\n" ; "indent block")]
#[test_case(r#"{{ index (dict "k" "v") "k" }}"#, "v" ; "dict index")]
#[test_case("{{ and 1 0 }}", "0" ; "and")]
#[test_case(r#"{{ or 0 "" "z" }}"#, "z" ; "or")]
#[test_case("{{ if lt 1 2.5 }}ok{{ end }}", "ok" ; "mixed comparison")]
#[test_case(r#"{{ len "héllo" }}"#, "5" ; "len counts chars")]
#[test_case(r#"{{ .missing | default "x" }}"#, "x" ; "default")]
#[test_case(r#"{{ printf "%05.1f|%-4s|%3d|%x" 3.14159 "ab" 7 255 }}"#, "003.1|ab  |  7|ff" ; "printf")]
#[test_case("{{ randomInt 1 1 }}", "1" ; "random int degenerate")]
#[test_case("{{ len (randomString 8) }}", "8" ; "random string length")]
#[test_case(r#"{{ randomChoice (list "a") }}"#, "a" ; "random choice single")]
#[test_case("{{ len (randomSubset (list 1 2 3) 5) }}", "3" ; "random subset clamps")]
#[test_case("{{ len (randomPermute (list 1 2 3)) }}", "3" ; "random permute")]
#[test_case("{{ len (randomStringList 4 2 2) }}", "4" ; "random string list")]
fn test_functions(source: &str, expected: &str) {
    assert_eq!(render_ok(source, &json!({})), expected);
}

#[test]
fn test_to_json_preserves_order() {
    let data = json!({"b": 1, "a": [1]});
    assert_eq!(render_ok("{{ toJson . }}", &data), r#"{"b":1,"a":[1]}"#);
}

#[test]
fn test_random_choice_on_empty_list_fails() {
    let err = Template::parse("{{ randomChoice (list) }}")
        .unwrap()
        .render(&json!({}))
        .unwrap_err();
    assert!(matches!(err, Error::Template { .. }));
}

#[test]
fn test_random_int_in_range() {
    let tpl = Template::parse("{{ randomInt 3 5 }}").unwrap();
    for _ in 0..20 {
        let n: i64 = tpl.render(&json!({})).unwrap().parse().unwrap();
        assert!((3..=5).contains(&n));
    }
}

#[test]
fn test_render_helper() {
    assert_eq!(render("{{ .a }}", &json!({"a": "b"})).unwrap(), "b");
}
