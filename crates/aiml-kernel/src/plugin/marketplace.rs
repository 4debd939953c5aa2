//! Marketplace contract
//!
//! Remote discovery and installation of plugins. The registry and the
//! hot-reload pipeline do not depend on it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A plugin advertised by a marketplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceEntry {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
}

/// A plugin found on disk in a plugins directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPlugin {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
}

/// Outcome of an install, update or uninstall request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceOutcome {
    pub success: bool,
    pub message: String,
}

impl MarketplaceOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Marketplace client
pub trait Marketplace: Send + Sync {
    /// Search the marketplace; an empty query lists everything.
    fn search_plugins(&self, query: &str) -> Vec<MarketplaceEntry>;

    /// Detailed information about one plugin.
    fn plugin_info(&self, plugin_id: &str) -> Option<MarketplaceEntry>;

    /// Install `plugin_id` into `target_dir`; `None` means latest.
    fn install_plugin(
        &self,
        plugin_id: &str,
        target_dir: &Path,
        version: Option<&str>,
    ) -> MarketplaceOutcome;

    /// Update an installed plugin; `None` means latest.
    fn update_plugin(
        &self,
        plugin_id: &str,
        target_dir: &Path,
        version: Option<&str>,
    ) -> MarketplaceOutcome;

    /// Remove the plugin installed at `plugin_dir`.
    fn uninstall_plugin(&self, plugin_dir: &Path) -> MarketplaceOutcome;

    /// Plugins present under `plugins_dir`.
    fn list_installed(&self, plugins_dir: &Path) -> Vec<InstalledPlugin>;

    /// Newer release of `plugin_id`, if any.
    fn check_updates(&self, plugin_id: &str, current_version: &str) -> Option<MarketplaceEntry>;
}
