//! Pattern tokens recognised inside expectation documents.
//!
//! Grammar:
//!
//! ```text
//! pattern     := alternative ("||" alternative)*
//! alternative := "@" type "@" ("." expander "(" args? ")")*
//! args        := arg ("," arg)*
//! arg         := 'string' | "string" | number
//! ```
//!
//! A string whose leading `@type@` names no known type is not a pattern and
//! is compared literally, so values such as `"@handle@example.com"` stay plain
//! strings.

use std::fmt;

use regex::Regex;
use serde_json::Value;

/// Value class named between the `@` signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeToken {
    String,
    Integer,
    Number,
    Double,
    Boolean,
    Null,
    Array,
    Uuid,
    DateTime,
    /// `@*@` / `@wildcard@`: any value.
    Wildcard,
    /// `@...@`: any value; as the last element of an expected array it lets
    /// the actual array carry any number of further elements.
    Unbounded,
}

impl TypeToken {
    fn from_name(name: &str) -> Option<Self> {
        let token = match name {
            "string" => Self::String,
            "integer" | "int" => Self::Integer,
            "number" => Self::Number,
            "double" | "float" => Self::Double,
            "boolean" | "bool" => Self::Boolean,
            "null" => Self::Null,
            "array" => Self::Array,
            "uuid" => Self::Uuid,
            "datetime" => Self::DateTime,
            "*" | "wildcard" => Self::Wildcard,
            "..." => Self::Unbounded,
            _ => return None,
        };
        Some(token)
    }

    fn accepts(self, actual: &Value) -> bool {
        match self {
            Self::String => actual.is_string(),
            Self::Integer => actual.is_i64() || actual.is_u64(),
            Self::Number => actual.is_number(),
            Self::Double => actual.is_f64(),
            Self::Boolean => actual.is_boolean(),
            Self::Null => actual.is_null(),
            Self::Array => actual.is_array(),
            Self::Uuid => actual
                .as_str()
                .is_some_and(|s| uuid::Uuid::parse_str(s).is_ok()),
            Self::DateTime => actual.as_str().is_some_and(is_datetime),
            Self::Wildcard | Self::Unbounded => true,
        }
    }
}

fn is_datetime(s: &str) -> bool {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};

    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Extra constraint chained onto a type token, e.g. `.startsWith('ord_')`.
#[derive(Debug, Clone)]
pub enum Expander {
    /// The key may be absent from the actual object.
    Optional,
    NotEmpty,
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    MatchRegex(Regex),
    LowerThan(f64),
    GreaterThan(f64),
}

impl Expander {
    fn from_call(name: &str, args: Vec<Arg>) -> Result<Self, PatternError> {
        let expander = match (name, args.as_slice()) {
            ("optional", []) => Self::Optional,
            ("notEmpty", []) => Self::NotEmpty,
            ("startsWith", [Arg::Str(s)]) => Self::StartsWith(s.clone()),
            ("endsWith", [Arg::Str(s)]) => Self::EndsWith(s.clone()),
            ("contains", [Arg::Str(s)]) => Self::Contains(s.clone()),
            ("matchRegex", [Arg::Str(s)]) => {
                Self::MatchRegex(Regex::new(s).map_err(PatternError::InvalidRegex)?)
            }
            ("lowerThan", [Arg::Num(n)]) => Self::LowerThan(*n),
            ("greaterThan", [Arg::Num(n)]) => Self::GreaterThan(*n),
            ("optional" | "notEmpty", _) => {
                return Err(PatternError::InvalidArguments {
                    expander: name.to_owned(),
                    expected: "no arguments",
                });
            }
            ("startsWith" | "endsWith" | "contains" | "matchRegex", _) => {
                return Err(PatternError::InvalidArguments {
                    expander: name.to_owned(),
                    expected: "one string argument",
                });
            }
            ("lowerThan" | "greaterThan", _) => {
                return Err(PatternError::InvalidArguments {
                    expander: name.to_owned(),
                    expected: "one number argument",
                });
            }
            _ => return Err(PatternError::UnknownExpander(name.to_owned())),
        };
        Ok(expander)
    }

    fn accepts(&self, actual: &Value) -> bool {
        match self {
            Self::Optional => true,
            Self::NotEmpty => match actual {
                Value::String(s) => !s.is_empty(),
                Value::Array(items) => !items.is_empty(),
                Value::Object(map) => !map.is_empty(),
                Value::Null => false,
                Value::Bool(_) | Value::Number(_) => true,
            },
            Self::StartsWith(prefix) => actual.as_str().is_some_and(|s| s.starts_with(prefix.as_str())),
            Self::EndsWith(suffix) => actual.as_str().is_some_and(|s| s.ends_with(suffix.as_str())),
            Self::Contains(needle) => actual.as_str().is_some_and(|s| s.contains(needle.as_str())),
            Self::MatchRegex(re) => actual.as_str().is_some_and(|s| re.is_match(s)),
            Self::LowerThan(bound) => actual.as_f64().is_some_and(|n| n < *bound),
            Self::GreaterThan(bound) => actual.as_f64().is_some_and(|n| n > *bound),
        }
    }
}

#[derive(Debug, Clone)]
struct Alternative {
    token: TypeToken,
    expanders: Vec<Expander>,
}

impl Alternative {
    fn accepts(&self, actual: &Value) -> bool {
        self.token.accepts(actual) && self.expanders.iter().all(|e| e.accepts(actual))
    }

    fn is_optional(&self) -> bool {
        self.expanders
            .iter()
            .any(|e| matches!(e, Expander::Optional))
    }
}

/// A parsed pattern token. Displays as the source text it was parsed from.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    alternatives: Vec<Alternative>,
}

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("unknown type @{0}@")]
    UnknownType(String),
    #[error("unknown expander {0}()")]
    UnknownExpander(String),
    #[error("{expander}() takes {expected}")]
    InvalidArguments {
        expander: String,
        expected: &'static str,
    },
    #[error("invalid regex: {0}")]
    InvalidRegex(#[source] regex::Error),
    #[error("unexpected input at {0:?}")]
    Syntax(String),
}

impl Pattern {
    /// Parse `text` as a pattern.
    ///
    /// Returns `None` when `text` is not a pattern at all (compare it
    /// literally), `Some(Err(_))` when it starts like a pattern but is
    /// malformed.
    pub fn parse(text: &str) -> Option<Result<Self, PatternError>> {
        let mut cursor = Cursor::new(text.trim());
        let first = TypeToken::from_name(cursor.type_name()?)?;
        Some(Self::parse_rest(text, first, &mut cursor))
    }

    fn parse_rest(text: &str, first: TypeToken, cursor: &mut Cursor<'_>) -> Result<Self, PatternError> {
        let mut alternatives = Vec::new();
        let mut token = first;
        loop {
            let mut expanders = Vec::new();
            while cursor.eat(".") {
                let name = cursor.ident()?;
                let args = cursor.args()?;
                expanders.push(Expander::from_call(name, args)?);
            }
            alternatives.push(Alternative { token, expanders });

            if cursor.is_empty() {
                break;
            }
            if !cursor.eat("||") {
                return Err(cursor.syntax_error());
            }
            let name = cursor
                .type_name()
                .ok_or_else(|| cursor.syntax_error())?;
            token = TypeToken::from_name(name)
                .ok_or_else(|| PatternError::UnknownType(name.to_owned()))?;
        }
        Ok(Self {
            source: text.to_owned(),
            alternatives,
        })
    }

    pub fn matches(&self, actual: &Value) -> bool {
        self.alternatives.iter().any(|alt| alt.accepts(actual))
    }

    /// An object key whose expected value is optional may be missing.
    pub fn is_optional(&self) -> bool {
        self.alternatives.iter().any(Alternative::is_optional)
    }

    /// `@...@` or a bare `@*@`: as the last element of an expected array,
    /// any number of trailing actual elements is allowed.
    pub fn is_unbounded(&self) -> bool {
        matches!(
            self.alternatives.as_slice(),
            [Alternative { token: TypeToken::Unbounded | TypeToken::Wildcard, expanders }]
                if expanders.is_empty()
        )
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Str(String),
    Num(f64),
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { rest: src }
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    fn syntax_error(&self) -> PatternError {
        PatternError::Syntax(self.rest.to_owned())
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, token: &str) -> bool {
        match self.rest.strip_prefix(token) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// Consume `@name@` and return `name`.
    fn type_name(&mut self) -> Option<&'a str> {
        let body = self.rest.strip_prefix('@')?;
        let end = body.find('@')?;
        let name = &body[..end];
        if name.is_empty() || name.contains(char::is_whitespace) {
            return None;
        }
        self.rest = &body[end + 1..];
        Some(name)
    }

    fn ident(&mut self) -> Result<&'a str, PatternError> {
        let end = self
            .rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return Err(self.syntax_error());
        }
        let (ident, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(ident)
    }

    fn args(&mut self) -> Result<Vec<Arg>, PatternError> {
        if !self.eat("(") {
            return Err(self.syntax_error());
        }
        let mut args = Vec::new();
        self.skip_ws();
        if self.eat(")") {
            return Ok(args);
        }
        loop {
            self.skip_ws();
            args.push(self.arg()?);
            self.skip_ws();
            if self.eat(")") {
                return Ok(args);
            }
            if !self.eat(",") {
                return Err(self.syntax_error());
            }
        }
    }

    fn arg(&mut self) -> Result<Arg, PatternError> {
        if let Some(quote) = self.rest.chars().next().filter(|c| *c == '"' || *c == '\'') {
            return self.quoted(quote).map(Arg::Str);
        }
        let end = self
            .rest
            .find([',', ')'])
            .ok_or_else(|| self.syntax_error())?;
        let number = self.rest[..end]
            .trim()
            .parse()
            .map_err(|_| self.syntax_error())?;
        self.rest = &self.rest[end..];
        Ok(Arg::Num(number))
    }

    fn quoted(&mut self, quote: char) -> Result<String, PatternError> {
        let mut out = String::new();
        let mut chars = self.rest.char_indices().skip(1);
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                c if c == quote => {
                    self.rest = &self.rest[i + c.len_utf8()..];
                    return Ok(out);
                }
                c => out.push(c),
            }
        }
        Err(self.syntax_error())
    }
}
