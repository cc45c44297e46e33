//! Case file format and loader.
//!
//! Each case file at `{cases_dir}/{group}/{id}.json` describes one HTTP
//! assertion: the request to send and the expected response.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// A single HTTP assertion loaded from a case file.
#[derive(Debug, Clone, Deserialize)]
pub struct Case {
    /// Group name used for filtering (usually the resource, e.g. `orders`).
    pub group: String,
    /// Unique identifier within the group (matches the filename stem).
    pub id: String,
    /// Human-readable description shown in the report.
    pub description: String,
    pub request: Request,
    pub expect: Expect,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Expect {
    pub status: u16,
    /// Subset match; extra response headers are allowed.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: Option<ExpectedBody>,
}

/// Expected body: the name of an expectation file, or the document inline.
/// Both may contain pattern tokens.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExpectedBody {
    Named(String),
    Inline(serde_json::Value),
}

/// Load every case file under `cases_dir`, optionally only one group.
/// Sorted by group, then id.
///
/// A missing group folder yields no cases. A case whose `group` or `id`
/// disagrees with where its file sits is rejected.
pub fn load_all(cases_dir: &Path, group: Option<&str>) -> Result<Vec<Case>> {
    let mut cases = Vec::new();
    for dir in group_dirs(cases_dir, group)? {
        for path in case_files(&dir)? {
            cases.push(Case::from_file(&path)?);
        }
    }
    cases.sort_by(|a, b| (&a.group, &a.id).cmp(&(&b.group, &b.id)));
    Ok(cases)
}

impl Case {
    pub fn label(&self) -> String {
        format!("{}/{}", self.group, self.id)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
        let case: Case = serde_json::from_str(&content)
            .with_context(|| format!("invalid case file {}", path.display()))?;
        case.check_location(path)?;
        Ok(case)
    }

    fn check_location(&self, path: &Path) -> Result<()> {
        let stem = path.file_stem().and_then(|s| s.to_str());
        if stem != Some(self.id.as_str()) {
            bail!(
                "case file {} declares id {:?}, expected the file name",
                path.display(),
                self.id
            );
        }
        let folder = path.parent().and_then(Path::file_name).and_then(|s| s.to_str());
        if folder != Some(self.group.as_str()) {
            bail!(
                "case file {} declares group {:?}, expected its folder name",
                path.display(),
                self.group
            );
        }
        Ok(())
    }
}

fn group_dirs(cases_dir: &Path, group: Option<&str>) -> Result<Vec<PathBuf>> {
    if let Some(g) = group {
        let dir = cases_dir.join(g);
        return Ok(if dir.is_dir() { vec![dir] } else { Vec::new() });
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(cases_dir).with_context(|| format!("cannot open {}", cases_dir.display()))? {
        let entry = entry.with_context(|| format!("cannot list {}", cases_dir.display()))?;
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

fn case_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("cannot read {}", dir.display()))? {
        let path = entry.with_context(|| format!("cannot list {}", dir.display()))?.path();
        if path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    Ok(files)
}
