//! Assertions on responses produced by an [`axum_test::TestServer`].
//!
//! All of them fail the calling test with a message naming what differed.

use axum_test::TestResponse;
use http::StatusCode;
use http::header::CONTENT_TYPE;

use crate::expectation::ExpectationStore;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Content type a JSON API answers with for `status`.
pub fn expected_content_type(status: StatusCode) -> &'static str {
    if status.as_u16() >= 400 {
        APPLICATION_PROBLEM_JSON
    } else {
        APPLICATION_JSON
    }
}

#[track_caller]
pub fn assert_response_code(response: &TestResponse, expected: StatusCode) {
    let actual = response.status_code();
    assert_eq!(
        actual,
        expected,
        "unexpected status code {actual}, body: {}",
        response.text()
    );
}

/// The `content-type` header must equal `expected` exactly.
#[track_caller]
pub fn assert_header(response: &TestResponse, expected: &str) {
    let actual = response
        .headers()
        .get(CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
    assert_eq!(
        actual.as_deref(),
        Some(expected),
        "unexpected {CONTENT_TYPE} header"
    );
}

#[track_caller]
pub fn assert_json_header(response: &TestResponse) {
    assert_header(response, expected_content_type(response.status_code()));
}

/// Compare the body with the JSON expectation `name`.
#[track_caller]
pub fn assert_json_response_content(response: &TestResponse, store: &ExpectationStore, name: &str) {
    store.assert_json_matches(&response.text(), name);
}

/// Status, JSON content type and body in one go.
#[track_caller]
pub fn assert_response(
    response: &TestResponse,
    store: &ExpectationStore,
    name: &str,
    status: StatusCode,
) {
    assert_response_code(response, status);
    assert_json_header(response);
    assert_json_response_content(response, store, name);
}
