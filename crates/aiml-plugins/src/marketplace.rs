//! Marketplace client
//!
//! Remote operations are not available yet: discovery finds nothing and
//! installs are refused. Local operations (listing and uninstalling) work
//! against the plugins directory.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use aiml_kernel::plugin::{InstalledPlugin, Marketplace, MarketplaceEntry, MarketplaceOutcome};

/// Default marketplace endpoint
pub const DEFAULT_MARKETPLACE_URL: &str = "https://plugins.aiml-dash.org";

/// Stems of the entry file that marks a directory as an installed plugin,
/// in lookup order
pub const ENTRY_STEMS: [&str; 2] = ["mod", "lib"];

/// Entry file of the plugin in `plugin_dir` for source files ending in `ext`
pub fn entry_file(plugin_dir: &Path, ext: &str) -> Option<PathBuf> {
    ENTRY_STEMS
        .iter()
        .map(|stem| plugin_dir.join(format!("{stem}.{ext}")))
        .find(|path| path.is_file())
}

/// Marketplace client without a remote backend
#[derive(Debug, Clone)]
pub struct PlaceholderMarketplace {
    url: String,
    source_extension: String,
}

impl Default for PlaceholderMarketplace {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PlaceholderMarketplace {
    pub fn new(url: Option<&str>) -> Self {
        Self {
            url: url.unwrap_or(DEFAULT_MARKETPLACE_URL).to_string(),
            source_extension: "rs".to_string(),
        }
    }

    /// Recognise plugins whose entry files end in `ext` instead of `rs`.
    pub fn with_source_extension(mut self, ext: &str) -> Self {
        self.source_extension = ext.trim_start_matches('.').to_string();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source_extension(&self) -> &str {
        &self.source_extension
    }
}

impl Marketplace for PlaceholderMarketplace {
    fn search_plugins(&self, query: &str) -> Vec<MarketplaceEntry> {
        info!("Searching marketplace {} for '{}'", self.url, query);
        Vec::new()
    }

    fn plugin_info(&self, plugin_id: &str) -> Option<MarketplaceEntry> {
        info!("Getting marketplace info for plugin {}", plugin_id);
        None
    }

    fn install_plugin(
        &self,
        plugin_id: &str,
        target_dir: &Path,
        _version: Option<&str>,
    ) -> MarketplaceOutcome {
        info!("Installing plugin '{}' to {:?}", plugin_id, target_dir);
        MarketplaceOutcome::failed("Marketplace installation not yet implemented")
    }

    fn update_plugin(
        &self,
        plugin_id: &str,
        _target_dir: &Path,
        _version: Option<&str>,
    ) -> MarketplaceOutcome {
        info!("Updating plugin '{}'", plugin_id);
        MarketplaceOutcome::failed("Plugin updates not yet implemented")
    }

    fn uninstall_plugin(&self, plugin_dir: &Path) -> MarketplaceOutcome {
        info!("Uninstalling plugin from {:?}", plugin_dir);

        if !plugin_dir.is_dir() {
            return MarketplaceOutcome::failed(format!(
                "Plugin directory not found: {}",
                plugin_dir.display()
            ));
        }

        match fs::remove_dir_all(plugin_dir) {
            Ok(()) => MarketplaceOutcome::ok(format!(
                "Successfully uninstalled plugin from {}",
                plugin_dir.display()
            )),
            Err(e) => MarketplaceOutcome::failed(format!("Error uninstalling plugin: {e}")),
        }
    }

    fn list_installed(&self, plugins_dir: &Path) -> Vec<InstalledPlugin> {
        let Ok(entries) = fs::read_dir(plugins_dir) else {
            return Vec::new();
        };

        let mut installed: Vec<InstalledPlugin> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter_map(|path| {
                let id = path.file_name()?.to_str()?.to_string();
                if id.starts_with('_') {
                    return None;
                }
                entry_file(&path, &self.source_extension)?;
                Some(InstalledPlugin {
                    name: id.clone(),
                    id,
                    path,
                })
            })
            .collect();

        installed.sort_by(|a, b| a.id.cmp(&b.id));
        installed
    }

    fn check_updates(&self, plugin_id: &str, current_version: &str) -> Option<MarketplaceEntry> {
        info!(
            "Checking updates for plugin '{}' version {}",
            plugin_id, current_version
        );
        None
    }
}
