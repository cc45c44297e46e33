use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing for test binaries. Output goes through the libtest
/// capture so it only shows for failing tests; filtered by `RUST_LOG`.
///
/// Safe to call multiple times; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_test_writer())
        .try_init();
}

/// Initialize structured JSON tracing on stderr for command-line tools,
/// keeping stdout free for the report. Filtered by `RUST_LOG`.
pub fn init_json_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .try_init();
}
