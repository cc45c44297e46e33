//! Structural matching of an actual JSON value against an expected one.
//!
//! The expected document drives the walk:
//!
//! - objects are non-exhaustive: every expected key must be present and
//!   match, extra actual keys are ignored;
//! - arrays are exhaustive unless the last expected element is `@...@` (or a
//!   bare `@*@`), which admits any number of trailing actual elements;
//! - scalars must have the same kind and value, numbers compared by value;
//! - strings that parse as a [`Pattern`] match by predicate.
//!
//! The first divergence stops the walk and is reported as a [`Mismatch`].

use std::fmt;

use serde_json::{Number, Value};

use crate::pattern::{Pattern, PatternError};

/// Where and how an actual value diverged from the expected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Location within the document, e.g. `root.items[2].id`.
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}, got {}", self.path, self.expected, self.actual)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    mismatch: Option<Mismatch>,
}

impl MatchResult {
    pub fn matched(&self) -> bool {
        self.mismatch.is_none()
    }

    pub fn mismatch(&self) -> Option<&Mismatch> {
        self.mismatch.as_ref()
    }

    pub fn into_result(self) -> Result<(), Mismatch> {
        match self.mismatch {
            None => Ok(()),
            Some(mismatch) => Err(mismatch),
        }
    }
}

/// Match `actual` against `expected`, which may contain pattern tokens.
pub fn match_json(expected: &Value, actual: &Value) -> MatchResult {
    let mut path = Vec::new();
    MatchResult {
        mismatch: walk(expected, actual, &mut path).err(),
    }
}

#[derive(Debug)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

fn render_path(path: &[Segment<'_>]) -> String {
    let mut out = String::from("root");
    for segment in path {
        match segment {
            Segment::Key(key) if is_plain_key(key) => {
                out.push('.');
                out.push_str(key);
            }
            // `root["a.b"]`, so keys holding `.` or `[` stay unambiguous.
            Segment::Key(key) => {
                out.push('[');
                out.push_str(&Value::from(*key).to_string());
                out.push(']');
            }
            Segment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    out
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

fn mismatch(path: &[Segment<'_>], expected: impl Into<String>, actual: impl Into<String>) -> Mismatch {
    Mismatch {
        path: render_path(path),
        expected: expected.into(),
        actual: actual.into(),
    }
}

type Parsed = Option<Result<Pattern, PatternError>>;

fn parse_expected(expected: &Value) -> Parsed {
    expected.as_str().and_then(Pattern::parse)
}

fn walk<'a>(expected: &'a Value, actual: &Value, path: &mut Vec<Segment<'a>>) -> Result<(), Mismatch> {
    match expected {
        Value::String(text) => walk_string(text, Pattern::parse(text), actual, path),
        Value::Object(fields) => {
            let Some(actual_fields) = actual.as_object() else {
                return Err(mismatch(path, "object", describe(actual)));
            };
            for (key, expected_value) in fields {
                path.push(Segment::Key(key));
                match actual_fields.get(key) {
                    Some(actual_value) => walk(expected_value, actual_value, path)?,
                    None => {
                        let parsed = parse_expected(expected_value);
                        if !matches!(&parsed, Some(Ok(p)) if p.is_optional()) {
                            let expected = summarize(expected_value, parsed.is_some());
                            return Err(mismatch(path, expected, "nothing (key is missing)"));
                        }
                    }
                }
                path.pop();
            }
            Ok(())
        }
        Value::Array(items) => {
            let Some(actual_items) = actual.as_array() else {
                return Err(mismatch(path, "array", describe(actual)));
            };
            // The last element is parsed once, both to detect the unbounded
            // tail and to match it as an ordinary element.
            let mut tail = match items.last() {
                Some(Value::String(text)) => Pattern::parse(text).map(|parsed| (text.as_str(), parsed)),
                _ => None,
            };
            let unbounded = matches!(&tail, Some((_, Ok(p))) if p.is_unbounded());
            let bounded = if unbounded { &items[..items.len() - 1] } else { items.as_slice() };

            if unbounded && actual_items.len() < bounded.len() {
                return Err(mismatch(
                    path,
                    format!("array of at least {} elements", bounded.len()),
                    describe(actual),
                ));
            }
            if !unbounded && actual_items.len() != bounded.len() {
                return Err(mismatch(
                    path,
                    format!("array of {} elements", bounded.len()),
                    describe(actual),
                ));
            }
            for (i, (expected_item, actual_item)) in bounded.iter().zip(actual_items).enumerate() {
                path.push(Segment::Index(i));
                let parsed_tail = if i + 1 == items.len() { tail.take() } else { None };
                match parsed_tail {
                    Some((text, parsed)) => walk_string(text, Some(parsed), actual_item, path)?,
                    None => walk(expected_item, actual_item, path)?,
                }
                path.pop();
            }
            Ok(())
        }
        Value::Number(expected_number) => match actual {
            Value::Number(actual_number) if numbers_equal(expected_number, actual_number) => Ok(()),
            _ => Err(mismatch(path, expected.to_string(), describe(actual))),
        },
        Value::Null | Value::Bool(_) => {
            if expected == actual {
                Ok(())
            } else {
                Err(mismatch(path, expected.to_string(), describe(actual)))
            }
        }
    }
}

fn walk_string(text: &str, parsed: Parsed, actual: &Value, path: &[Segment<'_>]) -> Result<(), Mismatch> {
    match parsed {
        Some(Ok(pattern)) if pattern.matches(actual) => Ok(()),
        Some(Ok(pattern)) => Err(mismatch(path, pattern.to_string(), describe(actual))),
        Some(Err(e)) => Err(mismatch(
            path,
            format!("{text} (invalid pattern: {e})"),
            describe(actual),
        )),
        None => match actual {
            Value::String(s) if s == text => Ok(()),
            _ => Err(mismatch(path, Value::from(text).to_string(), describe(actual))),
        },
    }
}

/// Integers beyond the `i64`/`u64` range were already parsed as `f64` and
/// compare as such.
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Kind-qualified rendering of an actual value, e.g. `string "abc"`.
fn describe(actual: &Value) -> String {
    match actual {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) if n.is_f64() => format!("number {n}"),
        Value::Number(n) => format!("integer {n}"),
        Value::String(_) => format!("string {actual}"),
        Value::Array(items) => format!("array of {} elements", items.len()),
        Value::Object(_) => "object".to_owned(),
    }
}

fn summarize(expected: &Value, is_pattern: bool) -> String {
    match expected {
        Value::Array(_) => "array".to_owned(),
        Value::Object(_) => "object".to_owned(),
        Value::String(text) if is_pattern => text.clone(),
        _ => expected.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn reason(expected: Value, actual: Value) -> String {
        match_json(&expected, &actual)
            .into_result()
            .expect_err("values should not match")
            .to_string()
    }

    #[test]
    fn should_match_identical_values() {
        let value = json!({
            "id": 7,
            "tags": ["a", "b"],
            "nested": {"ok": true, "none": null, "ratio": 0.5},
        });
        assert!(match_json(&value, &value).matched());
    }

    #[test]
    fn should_accept_wildcards_by_kind() {
        assert!(match_json(&json!({"id": "@integer@"}), &json!({"id": 42})).matched());
        assert!(!match_json(&json!({"id": "@integer@"}), &json!({"id": "42"})).matched());
    }

    #[test]
    fn should_treat_expected_object_as_subset() {
        assert!(match_json(&json!({"a": 1}), &json!({"a": 1, "b": 2})).matched());
        assert_eq!(
            reason(json!({"a": 1, "b": 2}), json!({"a": 1})),
            "root.b: expected 2, got nothing (key is missing)"
        );
    }

    #[test]
    fn should_allow_missing_optional_keys() {
        let expected = json!({"a": 1, "note": "@string@.optional()"});
        assert!(match_json(&expected, &json!({"a": 1})).matched());
        assert!(match_json(&expected, &json!({"a": 1, "note": "hi"})).matched());
        assert!(!match_json(&expected, &json!({"a": 1, "note": 3})).matched());
    }

    #[test]
    fn should_require_exact_array_length() {
        assert_eq!(
            reason(json!([1, 2]), json!([1, 2, 3])),
            "root: expected array of 2 elements, got array of 3 elements"
        );
        assert!(!match_json(&json!([1, 2]), &json!([1])).matched());
    }

    #[test]
    fn should_allow_trailing_elements_after_unbounded_token() {
        assert!(match_json(&json!([1, "@*@"]), &json!([1, 2, 3])).matched());
        assert!(match_json(&json!([1, "@...@"]), &json!([1])).matched());
        assert!(match_json(&json!(["@...@"]), &json!([])).matched());
        assert_eq!(
            reason(json!([1, 2, "@...@"]), json!([1])),
            "root: expected array of at least 2 elements, got array of 1 elements"
        );
        assert!(!match_json(&json!([1, "@*@"]), &json!([2, 3])).matched());
    }

    #[test]
    fn should_compare_numbers_by_value() {
        assert!(match_json(&json!(1), &json!(1.0)).matched());
        assert!(match_json(&json!(19.99), &json!(19.99)).matched());
        assert!(!match_json(&json!(1), &json!("1")).matched());
        assert!(!match_json(&json!(1), &json!(2)).matched());
    }

    #[test]
    fn should_not_coerce_scalar_kinds() {
        assert!(!match_json(&json!(null), &json!(false)).matched());
        assert!(!match_json(&json!("true"), &json!(true)).matched());
        assert!(!match_json(&json!({}), &json!([])).matched());
    }

    #[test]
    fn should_report_path_of_first_mismatch() {
        let expected = json!({"items": [{"id": 1}, {"id": 2}, {"id": "@integer@"}]});
        let actual = json!({"items": [{"id": 1}, {"id": 2}, {"id": "abc"}]});
        let result = match_json(&expected, &actual);
        let mismatch = result.mismatch().unwrap();
        assert_eq!(mismatch.path, "root.items[2].id");
        assert_eq!(
            mismatch.to_string(),
            r#"root.items[2].id: expected @integer@, got string "abc""#
        );
    }

    #[test]
    fn should_quote_keys_that_would_read_as_paths() {
        assert_eq!(
            reason(json!({"a.b": 1}), json!({"a.b": 2})),
            r#"root["a.b"]: expected 1, got integer 2"#
        );
        assert_eq!(
            reason(json!({"x[0]": {"id": 1}}), json!({"x[0]": {"id": 2}})),
            r#"root["x[0]"].id: expected 1, got integer 2"#
        );
        assert_eq!(
            reason(json!({"": 1}), json!({"": 2})),
            r#"root[""]: expected 1, got integer 2"#
        );
        assert_eq!(
            reason(json!({"created_at": 1}), json!({"created_at": 2})),
            "root.created_at: expected 1, got integer 2"
        );
    }

    #[test]
    fn should_match_pattern_in_last_array_slot() {
        assert!(match_json(&json!([1, "@string@"]), &json!([1, "x"])).matched());
        assert_eq!(
            reason(json!([1, "@string@"]), json!([1, 2])),
            "root[1]: expected @string@, got integer 2"
        );
        assert_eq!(
            reason(json!(["a", "b"]), json!(["a", "c"])),
            r#"root[1]: expected "b", got string "c""#
        );
    }

    #[test]
    fn should_show_pattern_text_for_missing_key() {
        assert_eq!(
            reason(json!({"id": "@integer@"}), json!({})),
            "root.id: expected @integer@, got nothing (key is missing)"
        );
        assert_eq!(
            reason(json!({"name": "bob"}), json!({})),
            r#"root.name: expected "bob", got nothing (key is missing)"#
        );
    }

    #[test]
    fn should_describe_literal_string_mismatch() {
        assert_eq!(
            reason(json!({"status": "created"}), json!({"status": "pending"})),
            r#"root.status: expected "created", got string "pending""#
        );
    }

    #[test]
    fn should_report_invalid_pattern_as_mismatch() {
        let message = reason(json!({"id": "@string@.shout()"}), json!({"id": "x"}));
        assert!(message.starts_with("root.id: expected @string@.shout() (invalid pattern"));
    }

    #[test]
    fn should_report_container_kind_mismatch() {
        assert_eq!(
            reason(json!({"a": {"b": 1}}), json!({"a": [1]})),
            "root.a: expected object, got array of 1 elements"
        );
    }

    #[test]
    fn should_be_pure() {
        let expected = json!({"id": "@integer@"});
        let actual = json!({"id": 1});
        let first = match_json(&expected, &actual);
        let second = match_json(&expected, &actual);
        assert_eq!(first, second);
    }
}
