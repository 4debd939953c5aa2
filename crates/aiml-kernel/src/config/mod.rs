//! Host configuration loading
//!
//! Loads the host's plugin settings from YAML, TOML, JSON, INI, RON or JSON5
//! files, with `${VAR}` / `$VAR` substitution and `AIML__*` environment
//! overrides.

use config::{Config as Cfg, Environment, File, FileFormat};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::plugin::{HotReloadConfig, PluginMetadata};

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "AIML";

static BRACED_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("braced env var pattern is valid")
});

static BARE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("bare env var pattern is valid")
});

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Detect configuration format from file extension
///
/// `.yaml`/`.yml`, `.toml`, `.json`, `.ini`, `.ron` and `.json5` are supported.
pub fn detect_format(path: &Path) -> ConfigResult<FileFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Substitute environment variables in a string
///
/// `${VAR}` is replaced first, then `$VAR`. Unset variables are left as
/// written.
pub fn substitute_env_vars(content: &str) -> String {
    let result = BRACED_VAR
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .to_string();

    BARE_VAR
        .replace_all(&result, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .to_string()
}

fn deserialize<T: DeserializeOwned>(builder: config::ConfigBuilder<config::builder::DefaultState>) -> ConfigResult<T> {
    let config = builder
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

/// Load configuration from a file, detecting the format from its extension.
pub fn load_config<T>(path: impl AsRef<Path>) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    from_str(&content, format)
}

/// Load configuration from a string with explicit format
pub fn from_str<T>(content: &str, format: FileFormat) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let substituted = substitute_env_vars(content);
    deserialize(Cfg::builder().add_source(File::from_str(&substituted, format)))
}

/// Load configuration with environment variable overrides
///
/// Variables are `<PREFIX>__<KEY>`, with `__` separating nested keys, e.g.
/// `AIML__HOT_RELOAD__DEBOUNCE_MS=250`.
pub fn load_with_env<T>(path: impl AsRef<Path>, env_prefix: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let substituted = substitute_env_vars(&content);

    deserialize(
        Cfg::builder()
            .add_source(File::from_str(&substituted, format))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            ),
    )
}

/// Settings of the plugin lifecycle manager as seen by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// Directory containing one subdirectory per plugin
    pub plugins_root: PathBuf,
    /// Directory for per-plugin settings files; `None` uses the user default
    pub settings_dir: Option<PathBuf>,
    /// Hot-reload tuning
    pub hot_reload: HotReloadConfig,
    /// Plugin metadata known to the host
    pub plugins: Vec<PluginMetadata>,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            plugins_root: PathBuf::from("plugins"),
            settings_dir: None,
            hot_reload: HotReloadConfig::default(),
            plugins: Vec::new(),
        }
    }
}

impl HostSettings {
    /// Load from `path` with `AIML__*` overrides applied.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        load_with_env(path, ENV_PREFIX)
    }
}

#[cfg(all(test, feature = "config"))]
mod unit_tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("host.yaml")).unwrap(), FileFormat::Yaml);
        assert_eq!(detect_format(Path::new("host.yml")).unwrap(), FileFormat::Yaml);
        assert_eq!(detect_format(Path::new("host.toml")).unwrap(), FileFormat::Toml);
        assert_eq!(detect_format(Path::new("host.json")).unwrap(), FileFormat::Json);
        assert_eq!(detect_format(Path::new("host.ini")).unwrap(), FileFormat::Ini);
        assert_eq!(detect_format(Path::new("host.ron")).unwrap(), FileFormat::Ron);
        assert_eq!(detect_format(Path::new("host.json5")).unwrap(), FileFormat::Json5);
        assert!(detect_format(Path::new("host.txt")).is_err());
        assert!(detect_format(Path::new("host")).is_err());
    }

    #[test]
    fn test_substitute_leaves_unknown_vars() {
        let out = substitute_env_vars("root: ${AIML_TEST_SURELY_UNSET_VAR}/plugins");
        assert_eq!(out, "root: ${AIML_TEST_SURELY_UNSET_VAR}/plugins");
    }

    #[test]
    fn test_host_settings_from_toml() {
        let toml = r#"
plugins_root = "/srv/dash/plugins"

[hot_reload]
debounce_ms = 500
source_extension = "py"

[[plugins]]
id = "core"
name = "Core"
locked = true

[[plugins]]
id = "model"
name = "Model"
default_enabled = false
"#;

        let settings: HostSettings = from_str(toml, FileFormat::Toml).unwrap();
        assert_eq!(settings.plugins_root, PathBuf::from("/srv/dash/plugins"));
        assert_eq!(settings.hot_reload.debounce_ms, 500);
        assert_eq!(settings.hot_reload.source_extension, "py");
        assert_eq!(settings.hot_reload.unit_namespace, "aiml_dash.plugins");
        assert_eq!(settings.plugins.len(), 2);
        assert!(settings.plugins[0].locked);
        assert!(!settings.plugins[1].default_enabled);
    }

    #[test]
    fn test_host_settings_defaults_from_empty_json() {
        let settings: HostSettings = from_str("{}", FileFormat::Json).unwrap();
        assert_eq!(settings, HostSettings::default());
    }
}
