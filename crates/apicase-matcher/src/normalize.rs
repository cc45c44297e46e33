//! Canonical pretty rendering of JSON text.

use std::io;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};

const INDENT: &[u8] = b"  ";

/// A JSON document together with its canonical text.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub value: Value,
    pub text: String,
}

impl Normalized {
    /// Parse `raw` and render it canonically. Object keys keep source order.
    pub fn parse(raw: &str, escape_unicode: bool) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(raw.trim())?;
        let text = to_pretty(&value, escape_unicode)?;
        Ok(Self { value, text })
    }
}

/// Re-serialize `raw` with two-space indentation.
///
/// With `escape_unicode` unset, non-ASCII is written as raw UTF-8 and `/`
/// stays literal; set, they become `\uXXXX` and `\/`. The output of
/// `normalize` is a fixed point: normalizing it again yields the same text.
///
/// Numbers go through `f64` once they leave the `i64`/`u64` range, so an
/// integer such as `123456789012345678901234567890` loses precision and is
/// rendered in exponent form. A magnitude `f64` cannot hold (`1e400`) is
/// rejected with a "number out of range" error.
pub fn normalize(raw: &str, escape_unicode: bool) -> Result<String, serde_json::Error> {
    Normalized::parse(raw, escape_unicode).map(|n| n.text)
}

pub fn to_pretty(value: &Value, escape_unicode: bool) -> Result<String, serde_json::Error> {
    let mut buf = Vec::with_capacity(128);
    if escape_unicode {
        let mut ser = Serializer::with_formatter(&mut buf, EscapingFormatter::default());
        value.serialize(&mut ser)?;
    } else {
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
        value.serialize(&mut ser)?;
    }
    // serde_json only ever writes UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Pretty formatter that also escapes non-ASCII characters and `/`.
struct EscapingFormatter {
    pretty: PrettyFormatter<'static>,
}

impl Default for EscapingFormatter {
    fn default() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(INDENT),
        }
    }
}

impl Formatter for EscapingFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut units = [0u16; 2];
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if c.is_ascii() && c != '/' {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..i])?;
            if c == '/' {
                writer.write_all(b"\\/")?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
            start = i + c.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_pretty_print_with_two_spaces_and_keep_key_order() {
        let text = normalize(r#"{"zeta":1,"alpha":{"b":[1,2],"a":null}}"#, false).unwrap();
        assert_eq!(
            text,
            "{\n  \"zeta\": 1,\n  \"alpha\": {\n    \"b\": [\n      1,\n      2\n    ],\n    \"a\": null\n  }\n}"
        );
    }

    #[test]
    fn should_ignore_whitespace_outside_strings() {
        let compact = normalize(r#"{"a":[1,"x y"]}"#, false).unwrap();
        let spaced = normalize("\n  { \"a\" :\t[ 1 , \"x y\" ] }  \n", false).unwrap();
        assert_eq!(compact, spaced);
    }

    #[test]
    fn should_keep_unicode_and_slashes_raw_by_default() {
        let text = normalize(r#"{"path":"a\/b","name":"Zoë ☃"}"#, false).unwrap();
        assert!(text.contains(r#""path": "a/b""#));
        assert!(text.contains("\"name\": \"Zoë ☃\""));
    }

    #[test]
    fn should_escape_unicode_and_slashes_when_asked() {
        let text = normalize(r#"{"path":"a/b","name":"Zoë 😀"}"#, true).unwrap();
        assert!(text.contains(r#""path": "a\/b""#), "{text}");
        assert!(text.contains(r#""name": "Zo\u00eb \ud83d\ude00""#), "{text}");
    }

    #[test]
    fn should_be_idempotent() {
        let inputs = [
            r#"{"id": 7, "status": "created", "total": 19.99}"#,
            r#"[[], {}, "", 0, -1.5e3, true, null, "é/ü"]"#,
            r#""just a string""#,
        ];
        for input in inputs {
            for escape in [false, true] {
                let once = normalize(input, escape).unwrap();
                let twice = normalize(&once, escape).unwrap();
                assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn should_fail_on_malformed_json() {
        assert!(normalize(r#"{"id": }"#, false).is_err());
        assert!(normalize("", false).is_err());
    }

    #[test]
    fn should_read_oversized_integers_as_floats() {
        let parsed = Normalized::parse("123456789012345678901234567890", false).unwrap();
        assert!(parsed.value.is_f64());
        assert_ne!(parsed.text, "123456789012345678901234567890");
        let approx = parsed.value.as_f64().unwrap();
        assert!((approx - 1.2345678901234568e29).abs() < 1e15, "{approx}");

        let max = Normalized::parse("18446744073709551615", false).unwrap();
        assert_eq!(max.value.as_u64(), Some(u64::MAX));
    }

    #[test]
    fn should_reject_numbers_beyond_f64() {
        let err = normalize("1e400", false).unwrap_err();
        assert!(err.to_string().contains("number out of range"), "{err}");
    }
}
