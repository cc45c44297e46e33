//! Test-case harness for JSON APIs built on axum.
//!
//! Runs a router in-process with `axum-test`, seeds the database from YAML
//! fixtures and compares responses with expectation files. Import in tests
//! only.

pub mod assert;
pub mod case;
pub mod expectation;
pub mod fixture;

pub use assert::{
    assert_header, assert_json_header, assert_json_response_content, assert_response,
    assert_response_code, expected_content_type,
};
pub use case::ApiTestCase;
pub use expectation::{ExpectationError, ExpectationStore};
pub use fixture::{FixtureRow, FixtureSet, FixtureStore, SeaOrmFixtureStore};

pub use apicase_core::HarnessError;
pub use apicase_core::path::TestFolders;
