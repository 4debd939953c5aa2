//! Per-plugin settings
//!
//! Each plugin's user settings live in `<dir>/<plugin_id>.json` as one JSON
//! object and are cached in memory after the first read.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

use aiml_kernel::plugin::PluginMetadata;

/// Settings of one plugin
pub type Settings = Map<String, Value>;

/// Settings store error types
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid plugin id for settings: '{0}'")]
    InvalidPluginId(String),

    #[error("Settings I/O error for plugin '{plugin_id}': {source}")]
    Io {
        plugin_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize settings for plugin '{plugin_id}': {source}")]
    Serialization {
        plugin_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No settings directory available")]
    NoSettingsDir,
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Default settings directory: `~/.aiml_dash/plugins`
pub fn default_settings_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".aiml_dash").join("plugins"))
}

/// File-backed, cached settings store
pub struct PluginSettingsStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Settings>>,
}

impl PluginSettingsStore {
    /// Open a store in `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> SettingsResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| SettingsError::Io {
            plugin_id: String::new(),
            source,
        })?;

        Ok(Self {
            dir,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Open a store in [`default_settings_dir`].
    pub fn open_default() -> SettingsResult<Self> {
        let dir = default_settings_dir().ok_or(SettingsError::NoSettingsDir)?;
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Settings file of `plugin_id`
    pub fn path_for(&self, plugin_id: &str) -> SettingsResult<PathBuf> {
        let mut components = Path::new(plugin_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.dir.join(format!("{plugin_id}.json"))),
            _ => Err(SettingsError::InvalidPluginId(plugin_id.to_string())),
        }
    }

    /// Settings of `plugin_id`. A missing or unreadable file yields empty
    /// settings.
    pub fn load(&self, plugin_id: &str) -> SettingsResult<Settings> {
        if let Some(settings) = self.cache.read().get(plugin_id) {
            return Ok(settings.clone());
        }

        let path = self.path_for(plugin_id)?;
        let settings = if path.exists() {
            match read_settings(&path) {
                Ok(settings) => {
                    info!("Loaded settings for plugin '{}'", plugin_id);
                    settings
                }
                Err(e) => {
                    error!("Error loading settings for plugin '{}': {}", plugin_id, e);
                    Settings::new()
                }
            }
        } else {
            Settings::new()
        };

        self.cache
            .write()
            .insert(plugin_id.to_string(), settings.clone());
        Ok(settings)
    }

    /// Replace the settings of `plugin_id`.
    pub fn save(&self, plugin_id: &str, settings: Settings) -> SettingsResult<()> {
        let path = self.path_for(plugin_id)?;
        let json = serde_json::to_string_pretty(&settings).map_err(|source| {
            SettingsError::Serialization {
                plugin_id: plugin_id.to_string(),
                source,
            }
        })?;
        fs::write(&path, json).map_err(|source| SettingsError::Io {
            plugin_id: plugin_id.to_string(),
            source,
        })?;

        self.cache.write().insert(plugin_id.to_string(), settings);
        info!("Saved settings for plugin '{}'", plugin_id);
        Ok(())
    }

    /// Merge `updates` into the settings of `plugin_id` and persist them.
    pub fn update(&self, plugin_id: &str, updates: Settings) -> SettingsResult<Settings> {
        let mut settings = self.load(plugin_id)?;
        settings.extend(updates);
        self.save(plugin_id, settings.clone())?;
        Ok(settings)
    }

    pub fn get(&self, plugin_id: &str, key: &str) -> SettingsResult<Option<Value>> {
        Ok(self.load(plugin_id)?.get(key).cloned())
    }

    pub fn set(&self, plugin_id: &str, key: &str, value: Value) -> SettingsResult<()> {
        let mut updates = Settings::new();
        updates.insert(key.to_string(), value);
        self.update(plugin_id, updates).map(|_| ())
    }

    /// Forget the settings of `plugin_id`. Returns whether a file existed.
    pub fn delete(&self, plugin_id: &str) -> SettingsResult<bool> {
        let path = self.path_for(plugin_id)?;
        self.cache.write().remove(plugin_id);

        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted settings for plugin '{}'", plugin_id);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SettingsError::Io {
                plugin_id: plugin_id.to_string(),
                source,
            }),
        }
    }

    /// Check `settings` against the plugin's `config_schema`. Returns one
    /// message per problem; empty means valid.
    pub fn validate(metadata: &PluginMetadata, settings: &Settings) -> Vec<String> {
        let Some(schema) = metadata.config_schema.as_ref() else {
            return Vec::new();
        };
        let mut errors = Vec::new();

        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for key in required.iter().filter_map(Value::as_str) {
                if !settings.contains_key(key) {
                    errors.push(format!("Missing required field: {key}"));
                }
            }
        }

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (key, value) in settings {
                let expected = properties
                    .get(key)
                    .and_then(|p| p.get("type"))
                    .and_then(Value::as_str);
                let Some(expected) = expected else {
                    continue;
                };

                match matches_type(value, expected) {
                    Some(true) => {}
                    Some(false) => errors.push(format!(
                        "Field '{key}' has type {}, expected {expected}",
                        json_type_name(value)
                    )),
                    None => warn!(
                        "Plugin '{}' schema uses unknown type '{}' for '{}'",
                        metadata.id, expected, key
                    ),
                }
            }
        }

        errors
    }
}

fn read_settings(path: &Path) -> Result<Settings, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str::<Settings>(&content).map_err(|e| e.to_string())
}

/// `None` for type names outside JSON Schema's primitive set.
fn matches_type(value: &Value, expected: &str) -> Option<bool> {
    let matches = match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => return None,
    };
    Some(matches)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
