//! Pusher Bridge Host - Main Library
//!
//! Shared pieces for the binaries that embed the bridge.
//!
//! ## Architecture
//!
//! - **bin_common**: Configuration, logging, runner and stdio protocol helpers
//! - **pusher_bridge**: Instance manager and event stream (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use pusher_host::bin_common::{load_config_from_env, ConfigType};
//! use pusher_host::pusher_bridge::InstanceManager;
//! ```

// Re-export workspace library for convenience
pub use pusher_bridge;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod config;
    pub mod logging;
    pub mod protocol;
    pub mod runner;

    pub use cli::{load_config_from_env, ConfigType};
    pub use config::{BridgeConfig, ConfigError};
    pub use logging::init_tracing_with_level;
    pub use protocol::{handle_line, HostReply, HostRequest};
    pub use runner::{join_worker, BinaryRunner, RunConfig};
}
