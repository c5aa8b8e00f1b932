//! # Instance Manager
//!
//! Registry of independent pub/sub sessions sharing one outbound stream.

pub mod manager;

pub use manager::InstanceManager;
