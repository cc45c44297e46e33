//! Runs HTTP expectation cases against a live service.
//!
//! Cases live at `{cases_dir}/{group}/{id}.json`; expected bodies are
//! expectation files (with pattern tokens) in the expected-responses folder.

pub mod case;
pub mod config;
pub mod reporter;
pub mod runner;

pub use case::{Case, ExpectedBody};
pub use config::ExpectHarnessConfig;
pub use reporter::Reporter;
pub use runner::{HeaderMismatch, RunResult, Runner};
