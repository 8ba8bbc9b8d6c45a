//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber. `RUST_LOG` takes precedence over
/// `default_level` when set.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
