//! Folder resolution for fixture and expected-response files.

use std::ffi::{OsStr, OsString};
use std::iter;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};
use std::sync::OnceLock;

use crate::config::{Config, HarnessConfig};
use crate::error::HarnessError;

/// Default fixture folder, relative to the test crate root.
pub const DEFAULT_FIXTURES_SUFFIX: &[&str] = &["tests", "fixtures"];
/// Default expected-response folder, relative to the test crate root.
pub const DEFAULT_EXPECTED_RESPONSES_SUFFIX: &[&str] = &["tests", "responses"];

/// Join `segments` with the platform separator.
///
/// No `.`/`..` normalization and no existence check: `build(["a", "..", "b"])`
/// is `a/../b`, and an absolute segment is appended verbatim.
pub fn build<I, S>(segments: I) -> PathBuf
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut joined = OsString::new();
    for (i, segment) in segments.into_iter().enumerate() {
        if i > 0 {
            joined.push(MAIN_SEPARATOR_STR);
        }
        joined.push(segment.as_ref());
    }
    PathBuf::from(joined)
}

/// `base/override` when an override is given, otherwise `base/<default_suffix...>`.
pub fn resolve_folder(override_dir: Option<&str>, base: &Path, default_suffix: &[&str]) -> PathBuf {
    match override_dir {
        Some(dir) => build([base.as_os_str(), OsStr::new(dir)]),
        None => build(iter::once(base.as_os_str()).chain(default_suffix.iter().map(OsStr::new))),
    }
}

/// Walk up from `start` to the nearest directory containing `Cargo.lock`.
/// Falls back to `start` itself.
pub fn workspace_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|p| p.join("Cargo.lock").exists())
        .unwrap_or(start)
        .to_path_buf()
}

/// A folder resolved once and reused for the lifetime of its owner.
#[derive(Debug, Default)]
pub struct FolderCache(OnceLock<PathBuf>);

impl FolderCache {
    pub fn get_or_resolve(&self, resolve: impl FnOnce() -> PathBuf) -> &Path {
        self.0.get_or_init(resolve)
    }

    pub fn is_resolved(&self) -> bool {
        self.0.get().is_some()
    }
}

/// Fixture and expected-response folders of one test case.
///
/// `base` is the test crate root (usually `env!("CARGO_MANIFEST_DIR")`).
#[derive(Debug)]
pub struct TestFolders {
    base: PathBuf,
    config: HarnessConfig,
    fixtures: FolderCache,
    expected_responses: FolderCache,
}

impl TestFolders {
    pub fn new(base: impl Into<PathBuf>, config: HarnessConfig) -> Self {
        Self {
            base: base.into(),
            config,
            fixtures: FolderCache::default(),
            expected_responses: FolderCache::default(),
        }
    }

    /// Folders under `base` with overrides read from the process environment.
    pub fn from_env(base: impl Into<PathBuf>) -> Result<Self, HarnessError> {
        Ok(Self::new(base, HarnessConfig::try_from_env()?))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn fixtures_folder(&self) -> &Path {
        self.fixtures.get_or_resolve(|| {
            let folder = resolve_folder(
                self.config.fixtures_override(),
                &self.base,
                DEFAULT_FIXTURES_SUFFIX,
            );
            ::tracing::debug!(folder = %folder.display(), "resolved fixtures folder");
            folder
        })
    }

    pub fn expected_responses_folder(&self) -> &Path {
        self.expected_responses.get_or_resolve(|| {
            let folder = resolve_folder(
                self.config.expected_responses_override(),
                &self.base,
                DEFAULT_EXPECTED_RESPONSES_SUFFIX,
            );
            ::tracing::debug!(folder = %folder.display(), "resolved expected responses folder");
            folder
        })
    }
}
