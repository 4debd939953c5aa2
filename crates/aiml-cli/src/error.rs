use aiml_kernel::config::ConfigError;
use aiml_plugins::{ReloadError, SettingsError};

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Hot reload error: {0}")]
    Reload(#[from] ReloadError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Plugin error: {0}")]
    PluginError(String),

    #[error("Token is absent or malformed")]
    InvalidToken,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
