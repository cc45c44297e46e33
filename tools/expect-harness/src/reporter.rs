//! Test result reporter: formats PASS/FAIL output and prints a summary.

use std::io::{self, Write};

use crate::case::Case;
use crate::runner::RunResult;

pub struct Reporter<W = io::Stdout> {
    out: W,
    passed: usize,
    /// Labels of failed cases, in run order.
    failed: Vec<String>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            passed: 0,
            failed: Vec::new(),
        }
    }

    pub fn record(&mut self, case: &Case, result: &RunResult) -> io::Result<()> {
        if result.passed() {
            self.passed += 1;
            return writeln!(self.out, "PASS  [{}] {}", case.label(), case.description);
        }

        self.failed.push(case.label());
        writeln!(self.out, "FAIL  [{}] {}", case.label(), case.description)?;
        if let Some(err) = &result.error {
            writeln!(self.out, "        error: {err}")?;
        }
        if let Some(actual) = result
            .actual_status
            .filter(|status| *status != result.expected_status)
        {
            writeln!(
                self.out,
                "        {} {} -> expected {}, got {}",
                case.request.method, case.request.path, result.expected_status, actual
            )?;
        }
        for mismatch in &result.header_mismatches {
            writeln!(self.out, "        header: {mismatch}")?;
        }
        if let Some(report) = &result.body_mismatch {
            for line in report.lines() {
                writeln!(self.out, "        {line}")?;
            }
        }
        Ok(())
    }

    /// Totals line, then the failed labels so they can be re-run by group.
    pub fn print_summary(&mut self) -> io::Result<()> {
        let total = self.passed + self.failed.len();
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{total} case(s): {} passed, {} failed",
            self.passed,
            self.failed.len()
        )?;
        if !self.failed.is_empty() {
            writeln!(self.out, "Failed: {}", self.failed.join(", "))?;
        }
        Ok(())
    }

    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::HeaderMismatch;

    fn case() -> Case {
        serde_json::from_str(
            r#"{
                "group": "orders", "id": "show", "description": "show one order",
                "request": { "method": "GET", "path": "/orders/7" },
                "expect": { "status": 200, "body": "order_created" }
            }"#,
        )
        .unwrap()
    }

    fn result(actual_status: u16) -> RunResult {
        RunResult {
            expected_status: 200,
            actual_status: Some(actual_status),
            header_mismatches: Vec::new(),
            body_mismatch: None,
            error: None,
        }
    }

    fn output(reporter: Reporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn should_print_pass_line_and_summary() {
        let mut reporter = Reporter::with_writer(Vec::new());
        reporter.record(&case(), &result(200)).unwrap();
        reporter.print_summary().unwrap();
        assert!(reporter.all_passed());
        let out = output(reporter);
        assert!(out.starts_with("PASS  [orders/show] show one order\n"), "{out}");
        assert!(out.ends_with("\n1 case(s): 1 passed, 0 failed\n"), "{out}");
        assert!(!out.contains("Failed:"), "{out}");
    }

    #[test]
    fn should_print_every_failure_detail() {
        let mut failing = result(500);
        failing.header_mismatches.push(HeaderMismatch {
            name: "content-type".to_owned(),
            expected: "application/json".to_owned(),
            actual: Vec::new(),
        });
        failing.body_mismatch = Some("order_created: root.status: mismatch\n-a\n+b".to_owned());

        let mut reporter = Reporter::with_writer(Vec::new());
        reporter.record(&case(), &failing).unwrap();
        assert!(!reporter.all_passed());
        let out = output(reporter);
        assert!(out.contains("FAIL  [orders/show] show one order\n"), "{out}");
        assert!(out.contains("        GET /orders/7 -> expected 200, got 500\n"), "{out}");
        assert!(
            out.contains("        header: content-type: missing (expected \"application/json\")\n"),
            "{out}"
        );
        assert!(out.contains("        -a\n        +b\n"), "{out}");
    }

    #[test]
    fn should_list_failed_cases_in_summary() {
        let other: Case = serde_json::from_str(
            r#"{
                "group": "users", "id": "me", "description": "current user",
                "request": { "method": "GET", "path": "/users/me" },
                "expect": { "status": 200 }
            }"#,
        )
        .unwrap();

        let mut reporter = Reporter::with_writer(Vec::new());
        reporter.record(&case(), &result(500)).unwrap();
        reporter.record(&other, &result(200)).unwrap();
        reporter.record(&other, &result(404)).unwrap();
        reporter.print_summary().unwrap();
        assert!(!reporter.all_passed());
        let out = output(reporter);
        assert!(
            out.ends_with("3 case(s): 1 passed, 2 failed\nFailed: orders/show, users/me\n"),
            "{out}"
        );
    }
}
