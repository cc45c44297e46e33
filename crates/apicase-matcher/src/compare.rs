//! Normalize, match and report in one step.

use std::fmt;

use tracing::{debug, warn};

use crate::diff::DiffReport;
use crate::matcher::{Mismatch, match_json};
use crate::normalize::Normalized;

/// Which side of a comparison a piece of JSON came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonSource {
    ActualResponse,
    ExpectationFile,
}

impl fmt::Display for JsonSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ActualResponse => "actual response",
            Self::ExpectationFile => "expectation file",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Escape non-ASCII and `/` in the rendered documents.
    pub escape_unicode: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// One side is not valid JSON. A setup fault, not a test outcome.
    #[error("malformed JSON in {source_kind}: {error}")]
    Parse {
        source_kind: JsonSource,
        #[source]
        error: serde_json::Error,
    },
    #[error("{report}")]
    Mismatch {
        mismatch: Mismatch,
        report: Box<DiffReport>,
    },
}

impl CompareError {
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}

/// Compare an actual body with an expectation document.
///
/// `subject` names the comparison in the report header, e.g. the
/// expectation name.
pub fn compare_json(
    actual_text: &str,
    expected_text: &str,
    subject: &str,
    options: CompareOptions,
) -> Result<(), CompareError> {
    let actual = Normalized::parse(actual_text, options.escape_unicode).map_err(|error| {
        CompareError::Parse {
            source_kind: JsonSource::ActualResponse,
            error,
        }
    })?;
    let expected = Normalized::parse(expected_text, options.escape_unicode).map_err(|error| {
        CompareError::Parse {
            source_kind: JsonSource::ExpectationFile,
            error,
        }
    })?;

    match match_json(&expected.value, &actual.value).into_result() {
        Ok(()) => {
            debug!(subject, "response matches expectation");
            Ok(())
        }
        Err(mismatch) => {
            warn!(subject, %mismatch, "response does not match expectation");
            let report = DiffReport::new(
                &expected.text,
                &actual.text,
                format!("{subject}: {mismatch}"),
            );
            Err(CompareError::Mismatch {
                mismatch,
                report: Box::new(report),
            })
        }
    }
}
