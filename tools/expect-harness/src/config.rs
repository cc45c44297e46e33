//! Expect harness configuration loaded from environment variables.

use std::time::Duration;

use apicase_core::Config;
use serde::Deserialize;

/// Settings for the HTTP client, read after `dotenv::dotenv().ok()`.
///
/// Folder overrides (`EXPECTED_RESPONSE_DIR`, `JSON_ESCAPE_UNICODE`) are read
/// separately through `HarnessConfig`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpectHarnessConfig {
    /// Per-request timeout in seconds (`REQUEST_TIMEOUT_SECS`).
    /// default: `30`
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// `User-Agent` sent with every request (`HARNESS_USER_AGENT`).
    /// default: `"expect-harness"`
    #[serde(default = "default_user_agent")]
    pub harness_user_agent: String,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "expect-harness".to_owned()
}

impl Config for ExpectHarnessConfig {}

impl ExpectHarnessConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ExpectHarnessConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            harness_user_agent: default_user_agent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> ExpectHarnessConfig {
        envy::from_iter(vars.iter().map(|(k, v)| (k.to_string(), v.to_string()))).unwrap()
    }

    #[test]
    fn should_default_when_unset() {
        let config = from_vars(&[]);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.harness_user_agent, "expect-harness");
    }

    #[test]
    fn should_read_overrides() {
        let config = from_vars(&[
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("HARNESS_USER_AGENT", "ci-runner"),
        ]);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.harness_user_agent, "ci-runner");
    }
}
