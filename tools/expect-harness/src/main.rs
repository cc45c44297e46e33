//! Expect harness: runs HTTP expectation cases against a live service.
//!
//! # Usage
//!
//! ```bash
//! # Run every case under <workspace>/cases against a local server
//! cargo run -p expect-harness -- --base-url http://localhost:3000
//!
//! # Run only the bundled orders group
//! EXPECTED_RESPONSE_DIR=tools/expect-harness/tests/responses \
//!   cargo run -p expect-harness -- --base-url http://localhost:3000 \
//!   --group orders --cases-dir tools/expect-harness/cases
//! ```
//!
//! Relative folders resolve against the workspace root (the nearest
//! directory holding `Cargo.lock`). Exits 0 when all cases pass, exits 1
//! when any fail.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use apicase_core::Config;
use apicase_core::path::{TestFolders, workspace_root};
use apicase_core::tracing::init_json_tracing;
use apicase_testing::ExpectationStore;
use expect_harness::{ExpectHarnessConfig, Reporter, Runner, case};

#[derive(Parser)]
#[command(about = "Run HTTP expectation cases against a live service")]
struct Args {
    /// Base URL of the service (e.g. http://localhost:3000)
    #[arg(long)]
    base_url: String,

    /// Run only the cases of this group
    #[arg(long)]
    group: Option<String>,

    /// Folder holding `{group}/{id}.json` case files
    #[arg(long, default_value = "cases")]
    cases_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_json_tracing();
    let args = Args::parse();

    let config = ExpectHarnessConfig::try_from_env()?;
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let root = workspace_root(&cwd);
    let folders = TestFolders::from_env(&root)?;
    let expectations = ExpectationStore::from_folders(&folders);

    let cases_dir = root.join(&args.cases_dir);
    let cases = case::load_all(&cases_dir, args.group.as_deref())?;
    if cases.is_empty() {
        eprintln!("No cases found in {}.", cases_dir.display());
        return Ok(());
    }

    println!("Running {} case(s) against {}", cases.len(), args.base_url);
    println!();

    let runner = Runner::new(&args.base_url, &config, expectations)?;
    let mut reporter = Reporter::new();

    for c in &cases {
        let result = runner.run(c).await;
        reporter.record(c, &result)?;
    }

    reporter.print_summary()?;

    if reporter.all_passed() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
