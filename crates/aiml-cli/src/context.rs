//! CLI context providing access to host settings and the plugin registry

use aiml_kernel::config::HostSettings;
use aiml_plugins::{
    PlaceholderMarketplace, PluginRegistry, PluginSettingsStore, default_settings_dir,
};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::CliError;
use crate::output::OutputFormat;

/// Shared context for CLI commands
pub struct CliContext {
    /// Host settings, from the config file or defaults
    pub settings: HostSettings,
    /// Registry built from the configured plugin metadata
    pub registry: PluginRegistry,
    /// Requested output format
    pub format: OutputFormat,
}

impl CliContext {
    /// Load host settings from `config`, or use defaults when none is given.
    pub fn load(config: Option<&Path>, format: OutputFormat) -> Result<Self, CliError> {
        let settings = match config {
            Some(path) => {
                debug!("Loading host settings from {:?}", path);
                HostSettings::load(path)?
            }
            None => HostSettings::default(),
        };
        let registry = PluginRegistry::from_metadata(settings.plugins.clone());

        Ok(Self {
            settings,
            registry,
            format,
        })
    }

    pub fn plugins_root(&self) -> &Path {
        &self.settings.plugins_root
    }

    /// Directory of plugin `id`, if `id` is a plain directory name.
    pub fn plugin_dir(&self, id: &str) -> Result<PathBuf, CliError> {
        let mut components = Path::new(id).components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(_)), None) => Ok(self.plugins_root().join(id)),
            _ => Err(CliError::PluginError(format!("Invalid plugin id: '{id}'"))),
        }
    }

    /// Marketplace client that recognises plugins by the configured source
    /// extension.
    pub fn marketplace(&self) -> PlaceholderMarketplace {
        PlaceholderMarketplace::default()
            .with_source_extension(&self.settings.hot_reload.source_extension)
    }

    /// Settings store in the configured directory, or the user default.
    pub fn settings_store(&self) -> Result<PluginSettingsStore, CliError> {
        let dir = match &self.settings.settings_dir {
            Some(dir) => dir.clone(),
            None => default_settings_dir()
                .ok_or_else(|| CliError::Other("No home directory for settings".to_string()))?,
        };
        Ok(PluginSettingsStore::new(dir)?)
    }
}
