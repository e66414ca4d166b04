//! Tracing subscriber setup

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize structured logging for the process.
///
/// The filter comes from `RUST_LOG` when set, falling back to the given
/// directive. Safe to call once per process; embedding applications that
/// install their own subscriber should skip this.
pub fn init_telemetry(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
