//! Hot-reload errors

use aiml_kernel::plugin::PluginError;

/// Reload error types
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("Failed to reload plugin '{plugin_id}' at unit '{address}': {source}")]
    UnitFailed {
        plugin_id: String,
        address: String,
        #[source]
        source: PluginError,
    },

    #[error("Reload of plugin '{0}' failed")]
    ReloadFailed(String),

    #[error("File watching unavailable: {0}")]
    WatchUnavailable(String),

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Hot reload already running")]
    AlreadyRunning,

    #[error("Watch thread panicked: {0}")]
    ThreadPanicked(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
