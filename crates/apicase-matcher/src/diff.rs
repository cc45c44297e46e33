//! Unified line diff between pretty-printed expected and actual documents.

use std::fmt;

use similar::{Algorithm, ChangeTag, TextDiff};

/// Unchanged lines kept around each change.
const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    Context,
    /// Line only in the expected text.
    Delete,
    /// Line only in the actual text.
    Insert,
}

impl DiffOp {
    fn sign(self) -> char {
        match self {
            Self::Context => ' ',
            Self::Delete => '-',
            Self::Insert => '+',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub op: DiffOp,
    pub text: String,
}

/// A run of changes with surrounding context. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<DiffLine>,
}

/// Reason line followed by the hunks turning `expected` into `actual`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffReport {
    reason: String,
    hunks: Vec<Hunk>,
}

impl DiffReport {
    pub fn new(expected_text: &str, actual_text: &str, reason: impl Into<String>) -> Self {
        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .diff_lines(expected_text, actual_text);

        let mut hunks = Vec::new();
        for group in diff.grouped_ops(CONTEXT_LINES) {
            let (Some(first), Some(last)) = (group.first(), group.last()) else {
                continue;
            };
            let old = first.old_range().start..last.old_range().end;
            let new = first.new_range().start..last.new_range().end;

            let mut lines = Vec::new();
            for op in &group {
                for change in diff.iter_changes(op) {
                    let op = match change.tag() {
                        ChangeTag::Equal => DiffOp::Context,
                        ChangeTag::Delete => DiffOp::Delete,
                        ChangeTag::Insert => DiffOp::Insert,
                    };
                    lines.push(DiffLine {
                        op,
                        text: change.value().trim_end_matches(['\n', '\r']).to_owned(),
                    });
                }
            }

            hunks.push(Hunk {
                old_start: hunk_start(old.start, old.len()),
                old_len: old.len(),
                new_start: hunk_start(new.start, new.len()),
                new_len: new.len(),
                lines,
            });
        }

        Self {
            reason: reason.into(),
            hunks,
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// True when both texts were line-identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}

// An empty range is addressed by the line before it, as in `diff -u`.
fn hunk_start(start: usize, len: usize) -> usize {
    if len == 0 { start } else { start + 1 }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.reason)?;
        writeln!(f, "--- expected")?;
        write!(f, "+++ actual")?;
        for hunk in &self.hunks {
            write!(
                f,
                "\n@@ -{},{} +{},{} @@",
                hunk.old_start, hunk.old_len, hunk.new_start, hunk.new_len
            )?;
            for line in &hunk.lines {
                write!(f, "\n{}{}", line.op.sign(), line.text)?;
            }
        }
        Ok(())
    }
}

/// Render the diff between `expected_text` and `actual_text` under a
/// `reason_prefix` header line.
pub fn render(expected_text: &str, actual_text: &str, reason_prefix: &str) -> String {
    DiffReport::new(expected_text, actual_text, reason_prefix).to_string()
}
