//! Pattern-aware JSON comparison for API expectation files.
//!
//! An expectation document is plain JSON in which string values such as
//! `"@integer@"` or `"@string@.startsWith('ord_')"` stand for a class of
//! values. [`match_json`] walks the expected document against the actual
//! one; [`compare_json`] runs the whole pipeline (normalize both sides,
//! match, render a [`DiffReport`] on failure).

pub mod compare;
pub mod diff;
pub mod matcher;
pub mod normalize;
pub mod pattern;

pub use compare::{CompareError, CompareOptions, JsonSource, compare_json};
pub use diff::{DiffLine, DiffOp, DiffReport, Hunk, render};
pub use matcher::{MatchResult, Mismatch, match_json};
pub use normalize::{Normalized, normalize};
pub use pattern::{Pattern, PatternError};
