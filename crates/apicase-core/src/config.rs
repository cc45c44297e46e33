use serde::Deserialize;

use crate::error::HarnessError;

/// Trait for loading harness configuration from environment variables.
///
/// Implementors derive `serde::Deserialize`; field names map to upper-cased
/// env vars (`fixtures_dir` <- `FIXTURES_DIR`).
pub trait Config: Sized + serde::de::DeserializeOwned {
    /// Load from the process environment, reporting bad values as a
    /// configuration error.
    fn try_from_env() -> Result<Self, HarnessError> {
        envy::from_env().map_err(|e| HarnessError::Configuration(e.to_string()))
    }

    /// # Panics
    ///
    /// Panics if any env var cannot be deserialized.
    fn from_env() -> Self {
        Self::try_from_env().expect("failed to load config from environment")
    }
}

/// Environment overrides consumed by the test harness.
///
/// | env var | effect |
/// |---|---|
/// | `FIXTURES_DIR` | fixture folder, relative to the test crate root |
/// | `EXPECTED_RESPONSE_DIR` | expected response folder, relative to the test crate root |
/// | `JSON_ESCAPE_UNICODE` | `true` escapes non-ASCII and `/` when normalizing JSON |
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub fixtures_dir: Option<String>,
    #[serde(default)]
    pub expected_response_dir: Option<String>,
    #[serde(default)]
    pub json_escape_unicode: bool,
}

impl Config for HarnessConfig {}

impl HarnessConfig {
    /// Build from an explicit list of `(NAME, value)` pairs instead of the
    /// process environment.
    pub fn from_vars<I>(vars: I) -> Result<Self, HarnessError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars).map_err(|e| HarnessError::Configuration(e.to_string()))
    }

    /// `FIXTURES_DIR`, ignoring an empty value.
    pub fn fixtures_override(&self) -> Option<&str> {
        non_empty(self.fixtures_dir.as_deref())
    }

    /// `EXPECTED_RESPONSE_DIR`, ignoring an empty value.
    pub fn expected_responses_override(&self) -> Option<&str> {
        non_empty(self.expected_response_dir.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
