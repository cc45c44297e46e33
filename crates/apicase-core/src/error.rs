use std::path::{Path, PathBuf};

/// Setup and environment faults raised by the harness.
///
/// These abort the test immediately. A response that does not match its
/// expectation is not a `HarnessError`; it is reported as a mismatch.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Configuration(String),
    #[error("invalid fixture file {}: {source}", path.display())]
    FixtureFormat {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("test client error: {0}")]
    Client(#[source] anyhow::Error),
}

impl HarnessError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "IO",
            Self::Configuration(_) => "CONFIGURATION",
            Self::FixtureFormat { .. } => "FIXTURE_FORMAT",
            Self::Database(_) => "DATABASE",
            Self::Client(_) => "CLIENT",
        }
    }

    /// Wrap an IO failure, recording the absolute form of `path`.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: absolute(path),
            source,
        }
    }

    pub fn missing_source(path: &Path) -> Self {
        Self::Configuration(format!("file {} does not exist", absolute(path).display()))
    }

    pub fn no_fixture_files(dir: &Path) -> Self {
        Self::Configuration(format!(
            "there are no files to load in folder {}",
            absolute(dir).display()
        ))
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
