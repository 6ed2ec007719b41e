//! Tracing bootstrap.
//!
//! ## Log Levels
//! - Default: `info`, debug for the gunpla crates, warn for sqlx
//! - Override with `RUST_LOG`, e.g. `RUST_LOG=gunpla_db=trace`

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,gunpla_db=debug,gunpla_service=debug,sqlx=warn";

/// Installs the global fmt subscriber. Call once, at startup.
pub fn init() {
    tracing_subscriber::fmt().with_env_filter(filter()).init();
}

/// Subscriber for tests: output is captured per test. Safe to call repeatedly.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_test_writer()
        .try_init();
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
