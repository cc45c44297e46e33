//! Expected-response files.
//!
//! An expectation named `order_created` lives at
//! `<expected responses folder>/order_created.json` and may contain pattern
//! tokens (`"@integer@"`, `"@string@.optional()"`, ...).

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use apicase_core::HarnessError;
use apicase_core::path::{TestFolders, build};
use apicase_matcher::{CompareError, CompareOptions, compare_json};

/// Extension used for JSON expectation files.
pub const JSON: &str = "json";

#[derive(Debug, thiserror::Error)]
pub enum ExpectationError {
    #[error(transparent)]
    Setup(#[from] HarnessError),
    #[error(transparent)]
    Compare(#[from] CompareError),
}

impl ExpectationError {
    /// True for a response that does not match, false for setup faults.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Compare(e) if e.is_mismatch())
    }
}

#[derive(Debug, Clone)]
pub struct ExpectationStore {
    folder: PathBuf,
    options: CompareOptions,
}

impl ExpectationStore {
    pub fn new(folder: impl Into<PathBuf>, options: CompareOptions) -> Self {
        Self {
            folder: folder.into(),
            options,
        }
    }

    /// Store over the expected-responses folder, honoring `JSON_ESCAPE_UNICODE`.
    pub fn from_folders(folders: &TestFolders) -> Self {
        Self::new(
            folders.expected_responses_folder(),
            CompareOptions {
                escape_unicode: folders.config().json_escape_unicode,
            },
        )
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn options(&self) -> CompareOptions {
        self.options
    }

    pub fn path_for(&self, name: &str, extension: &str) -> PathBuf {
        let file = format!("{name}.{extension}");
        build([self.folder.as_os_str(), OsStr::new(&file)])
    }

    /// Read an expectation file verbatim.
    pub fn read(&self, name: &str, extension: &str) -> Result<String, HarnessError> {
        let path = self.path_for(name, extension);
        fs::read_to_string(&path).map_err(|e| HarnessError::io(&path, e))
    }

    /// Compare `actual_body` with the JSON expectation `name`.
    pub fn check_json(&self, actual_body: &str, name: &str) -> Result<(), ExpectationError> {
        let expected = self.read(name, JSON)?;
        compare_json(actual_body, &expected, name, self.options)?;
        Ok(())
    }

    /// Like [`check_json`](Self::check_json), failing the calling test with
    /// the diff report.
    #[track_caller]
    pub fn assert_json_matches(&self, actual_body: &str, name: &str) {
        if let Err(e) = self.check_json(actual_body, name) {
            panic!("{e}");
        }
    }
}
