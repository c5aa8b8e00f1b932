//! Logging initialization

use tracing_subscriber::EnvFilter;

/// Initialize tracing with the configured level
///
/// `RUST_LOG` takes precedence when set. Output goes to stderr so stdout
/// stays free for the host protocol.
pub fn init_tracing_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A subscriber may already be installed (tests, embedding hosts)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .try_init();
}
