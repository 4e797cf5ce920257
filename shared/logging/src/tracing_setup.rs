//! Tracing subscriber initialization

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber for an interactive/dev environment:
/// compact, human-readable lines gated by `RUST_LOG` (defaults to `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();
}

/// Initialize the global tracing subscriber for production use: one JSON
/// object per line so log shippers can parse it directly.
pub fn init_json_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();
}
