//! Typed errors for the plugin sub-system.

use thiserror::Error;

/// Errors that can occur while loading or re-executing plugin units.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PluginError {
    /// The unit's builder returned an error.
    #[error("Unit '{address}' failed to build: {reason}")]
    BuildFailed {
        /// Address of the unit being built.
        address: String,
        /// What the builder reported.
        reason: String,
    },

    /// The unit's builder panicked.
    #[error("Unit '{address}' panicked while building: {message}")]
    BuildPanicked {
        /// Address of the unit being built.
        address: String,
        /// Panic payload, when it was a string.
        message: String,
    },

    /// A unit was addressed that is not in the loaded-unit table.
    #[error("Unit not loaded: {0}")]
    NotLoaded(String),

    /// A unit with the same address is already loaded.
    #[error("Unit already loaded: {0}")]
    AlreadyLoaded(String),

    /// An I/O error surfaced during a plugin operation.
    #[error("Plugin I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A (de)serialization error surfaced during a plugin operation.
    #[error("Plugin serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// Catch-all for errors that don't fit the above categories.
    #[error("{0}")]
    Other(String),
}

impl PluginError {
    /// Shorthand used by unit builders.
    pub fn build_failed(address: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        PluginError::BuildFailed {
            address: address.into(),
            reason: reason.to_string(),
        }
    }
}
