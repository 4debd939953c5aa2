//! AIML Kernel
//!
//! Shared contracts of the plugin lifecycle manager: plugin metadata and its
//! resolved view, reloadable unit traits, hot-reload settings, the
//! marketplace interface and (behind the `config` feature) host settings
//! loading.

// plugin module
pub mod plugin;
pub use plugin::*;

// config module
#[cfg(feature = "config")]
pub mod config;
