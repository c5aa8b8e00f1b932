//! Binary runner utilities
//!
//! Provides a standardized way to run host binaries with banners
//! and configuration logging.

use crate::bin_common::config::BridgeConfig;
use std::thread::JoinHandle;
use tracing::{info, warn};

/// Configuration for running a binary application
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Name of the binary (for logging)
    pub name: String,
    /// Forward diagnostics to stderr
    pub emit_diagnostics: bool,
}

impl RunConfig {
    /// Create a new run configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emit_diagnostics: true,
        }
    }

    /// Set diagnostics forwarding
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.emit_diagnostics = enabled;
        self
    }

    /// Build from the loaded host configuration
    pub fn from_bridge_config(name: impl Into<String>, config: &BridgeConfig) -> Self {
        Self::new(name).with_diagnostics(config.emit_diagnostics)
    }
}

/// Join a helper thread, logging a panic instead of discarding it
///
/// Returns `true` if the thread exited normally.
pub fn join_worker(name: &str, handle: JoinHandle<()>) -> bool {
    match handle.join() {
        Ok(()) => true,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!("{} thread panicked: {}", name, reason);
            false
        }
    }
}

/// Trait for binary applications
#[allow(async_fn_in_trait)]
pub trait BinaryRunner {
    /// Run the application main loop
    async fn run(&mut self) -> anyhow::Result<()>;

    /// Get the run configuration
    fn config(&self) -> &RunConfig;

    /// Print startup banner
    fn print_banner(&self) {
        let config = self.config();
        info!("========================================");
        info!("Starting {}", config.name);
        info!("Reading commands from stdin, close it to stop");
        info!("========================================");
    }

    /// Print shutdown banner
    fn print_shutdown(&self, stats: Option<&str>) {
        let config = self.config();
        info!("========================================");
        info!("{} stopped", config.name);
        if let Some(stats) = stats {
            info!("{}", stats);
        }
        info!("========================================");
    }

    /// Execute the binary with banners around the main loop
    async fn execute(&mut self) -> anyhow::Result<()> {
        self.print_banner();
        let result = self.run().await;
        self.print_shutdown(None);
        result
    }
}
