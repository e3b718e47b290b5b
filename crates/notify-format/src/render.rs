//! Value rendering helpers shared by the formatters.
//!
//! Everything here is total: absent or oddly-typed values come back as empty
//! strings rather than errors.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Map, Number, Value};

/// Characters left alone by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Largest integer an `f64` holds exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Renders a scalar for display.
///
/// Strings are returned verbatim, numbers without a trailing `.0`, booleans as
/// `true`/`false`. Absent and `null` values are empty. Arrays and objects are
/// compact JSON.
#[must_use]
pub fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => number(n),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Renders `map[key]` with [`text`].
#[must_use]
pub fn field(map: &Map<String, Value>, key: &str) -> String {
    text(map.get(key))
}

/// Returns the nested object at `map[key]`, if there is one.
#[must_use]
pub fn object<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

/// Renders a value for a free-form listing.
///
/// Like [`text`], except that `null` is spelled out.
#[must_use]
pub fn listing(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        other => text(Some(other)),
    }
}

fn number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Returns the text after the last `sep`, or the whole string if there is none.
#[must_use]
pub fn last_segment(s: &str, sep: char) -> &str {
    s.rsplit(sep).next().unwrap_or_default()
}

/// Returns the region component of an ARN (`arn:partition:service:region:...`).
#[must_use]
pub fn arn_region(arn: &str) -> &str {
    arn.split(':').nth(3).unwrap_or_default()
}

/// Percent-encodes a string the way `encodeURIComponent` does.
#[must_use]
pub fn encode_uri_component(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(json!("abc"), "abc" ; "string verbatim")]
    #[test_case(json!(80), "80" ; "integer")]
    #[test_case(json!(80.0), "80" ; "integral float")]
    #[test_case(json!(0.5), "0.5" ; "fractional float")]
    #[test_case(json!(-3), "-3" ; "negative")]
    #[test_case(json!(true), "true" ; "boolean")]
    #[test_case(json!(null), "" ; "null is empty")]
    #[test_case(json!({"a": 1}), r#"{"a":1}"# ; "object is compact json")]
    #[test_case(json!([1, "x"]), r#"[1,"x"]"# ; "array is compact json")]
    fn renders_text(value: Value, expected: &str) {
        assert_eq!(text(Some(&value)), expected);
    }

    #[test]
    fn absent_is_empty() {
        assert_eq!(text(None), "");
        assert_eq!(field(&Map::new(), "missing"), "");
    }

    #[test]
    fn listing_spells_null() {
        assert_eq!(listing(&Value::Null), "null");
        assert_eq!(listing(&json!("x")), "x");
    }

    #[test_case("arn:aws:ecs:us-west-2:123:cluster/example-cluster", '/', "example-cluster" ; "arn path")]
    #[test_case("service:example-service", ':', "example-service" ; "group")]
    #[test_case("no-separator", '/', "no-separator" ; "whole string")]
    #[test_case("", '/', "" ; "empty")]
    #[test_case("trailing/", '/', "" ; "trailing separator")]
    fn last_segments(input: &str, sep: char, expected: &str) {
        assert_eq!(last_segment(input, sep), expected);
    }

    #[test]
    fn arn_regions() {
        assert_eq!(
            arn_region("arn:aws:sns:eu-west-1:123456789012:alerts:abc"),
            "eu-west-1"
        );
        assert_eq!(arn_region("not-an-arn"), "");
    }

    #[test_case("cpu-high", "cpu-high" ; "unreserved untouched")]
    #[test_case("cpu high", "cpu%20high" ; "space")]
    #[test_case("a/b;c=d", "a%2Fb%3Bc%3Dd" ; "reserved")]
    #[test_case("it's (ok)!*~", "it's%20(ok)!*~" ; "marks kept")]
    #[test_case("é", "%C3%A9" ; "utf8")]
    fn uri_component(input: &str, expected: &str) {
        assert_eq!(encode_uri_component(input), expected);
    }
}
