//! Shared plumbing for apicase test harnesses.
//!
//! Path resolution for fixture and expectation folders, env-driven
//! configuration, the harness error taxonomy and tracing setup.

pub mod config;
pub mod error;
pub mod path;
pub mod tracing;

pub use config::{Config, HarnessConfig};
pub use error::HarnessError;
