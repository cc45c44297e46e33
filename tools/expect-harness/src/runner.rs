//! HTTP request runner: sends one case request and checks the response.

use std::fmt;

use apicase_matcher::compare_json;
use apicase_testing::ExpectationStore;
use reqwest::Client;
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

use crate::case::{Case, ExpectedBody};
use crate::config::ExpectHarnessConfig;

/// Result of running a single case.
#[derive(Debug)]
pub struct RunResult {
    pub expected_status: u16,
    pub actual_status: Option<u16>,
    pub header_mismatches: Vec<HeaderMismatch>,
    /// Diff report when the body did not match its expectation.
    pub body_mismatch: Option<String>,
    /// Set when the case could not be run (connection refused, missing or
    /// malformed expectation, bad method).
    pub error: Option<String>,
}

impl RunResult {
    fn failed(expected_status: u16, error: String) -> Self {
        Self {
            expected_status,
            actual_status: None,
            header_mismatches: Vec::new(),
            body_mismatch: None,
            error: Some(error),
        }
    }

    pub fn passed(&self) -> bool {
        self.error.is_none()
            && self.actual_status == Some(self.expected_status)
            && self.header_mismatches.is_empty()
            && self.body_mismatch.is_none()
    }
}

pub struct Runner {
    client: Client,
    base_url: String,
    expectations: ExpectationStore,
}

impl Runner {
    pub fn new(
        base_url: &str,
        config: &ExpectHarnessConfig,
        expectations: ExpectationStore,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.harness_user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            expectations,
        })
    }

    pub async fn run(&self, case: &Case) -> RunResult {
        let expected_status = case.expect.status;
        let url = format!("{}{}", self.base_url, case.request.path);

        let Ok(method) = reqwest::Method::from_bytes(case.request.method.to_uppercase().as_bytes())
        else {
            return RunResult::failed(
                expected_status,
                format!("unknown HTTP method: {}", case.request.method),
            );
        };

        let mut req = self.client.request(method, &url);
        for (k, v) in &case.request.headers {
            req = req.header(k, v);
        }
        if let Some(body) = &case.request.body {
            req = req.json(body);
        }

        debug!(case = %case.label(), %url, "sending request");
        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => return RunResult::failed(expected_status, e.to_string()),
        };

        let actual_status = resp.status().as_u16();
        let header_mismatches = header_mismatches(case, resp.headers());

        let body_text = match resp.text().await {
            Ok(text) => text,
            Err(e) => return RunResult::failed(expected_status, e.to_string()),
        };

        let (body_mismatch, error) = match self.check_body(case, &body_text) {
            Ok(()) => (None, None),
            Err(BodyFailure::Mismatch(report)) => (Some(report), None),
            Err(BodyFailure::Setup(e)) => (None, Some(e)),
        };

        let result = RunResult {
            expected_status,
            actual_status: Some(actual_status),
            header_mismatches,
            body_mismatch,
            error,
        };
        if !result.passed() {
            warn!(case = %case.label(), actual_status, "case failed");
        }
        result
    }

    fn check_body(&self, case: &Case, body_text: &str) -> Result<(), BodyFailure> {
        match &case.expect.body {
            None => Ok(()),
            Some(ExpectedBody::Named(name)) => self
                .expectations
                .check_json(body_text, name)
                .map_err(|e| BodyFailure::new(e.is_mismatch(), e.to_string())),
            Some(ExpectedBody::Inline(expected)) => compare_json(
                body_text,
                &expected.to_string(),
                &case.label(),
                self.expectations.options(),
            )
            .map_err(|e| BodyFailure::new(e.is_mismatch(), e.to_string())),
        }
    }
}

#[derive(Debug)]
enum BodyFailure {
    Mismatch(String),
    Setup(String),
}

impl BodyFailure {
    fn new(is_mismatch: bool, message: String) -> Self {
        if is_mismatch {
            Self::Mismatch(message)
        } else {
            Self::Setup(message)
        }
    }
}

/// An expected response header that was absent or carried another value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMismatch {
    pub name: String,
    pub expected: String,
    /// Every value the response sent under `name`; empty when absent.
    pub actual: Vec<String>,
}

impl fmt::Display for HeaderMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.actual.is_empty() {
            return write!(f, "{}: missing (expected {:?})", self.name, self.expected);
        }
        write!(f, "{}: expected {:?}, got {}", self.name, self.expected, self.actual.join(", "))
    }
}

/// Expected headers are a subset of the response's. A header passes when any
/// of its values equals the expected one; an expected value without `;`
/// parameters only has to equal the media type, so `application/json`
/// accepts `application/json; charset=utf-8`.
fn header_mismatches(case: &Case, headers: &HeaderMap) -> Vec<HeaderMismatch> {
    case.expect
        .headers
        .iter()
        .filter_map(|(name, expected)| {
            let actual: Vec<String> = headers
                .get_all(name.as_str())
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            if actual.iter().any(|value| header_value_matches(expected, value)) {
                return None;
            }
            Some(HeaderMismatch {
                name: name.clone(),
                expected: expected.clone(),
                actual,
            })
        })
        .collect()
}

fn header_value_matches(expected: &str, actual: &str) -> bool {
    let expected = expected.trim();
    let actual = actual.trim();
    if expected == actual {
        return true;
    }
    if expected.contains(';') {
        return false;
    }
    actual
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(expected))
}
