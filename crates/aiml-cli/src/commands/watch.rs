//! `aiml watch` command implementation
//!
//! Loads every installed plugin's source files as units, then reloads them
//! as they change until Ctrl-C.

use aiml_kernel::plugin::{
    HotReloadConfig, InstalledPlugin, Marketplace, PluginResult, SubUnit, UnitHandle, unit_address,
};
use aiml_plugins::hot_reload::{HotReload, ReloadObserver, ReloadOrderer, UnitRegistry};
use aiml_plugins::{create_hot_reloader, entry_file};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::CliError;
use crate::context::CliContext;

/// Execute the `aiml watch` command
pub async fn run(ctx: &CliContext) -> Result<(), CliError> {
    let root = ctx.plugins_root();
    let config = ctx.settings.hot_reload.clone();

    if !root.is_dir() {
        return Err(CliError::PluginError(format!(
            "Plugins directory not found: {}",
            root.display()
        )));
    }

    let installed = ctx.marketplace().list_installed(root);
    let units = Arc::new(UnitRegistry::new());
    let loaded = register_source_units(&units, &installed, &config);
    info!("Loaded {} units from {} plugins", loaded, installed.len());

    let orderer = Arc::new(ReloadOrderer::with_namespace(
        units.clone(),
        &config.unit_namespace,
    ));
    let observer: ReloadObserver = Arc::new(|plugin_id: &str| {
        println!("{} Reloaded plugin {}", "✓".green(), plugin_id.cyan());
    });

    let mut supervisor = match create_hot_reloader(root, config, orderer, Some(observer)) {
        HotReload::Available(supervisor) => supervisor,
        HotReload::Unavailable { reason } => {
            return Err(CliError::Other(format!("Hot reload unavailable: {reason}")));
        }
    };

    let guard = supervisor.start_scoped()?;
    println!(
        "{} Watching {} (Ctrl-C to stop)",
        "→".green(),
        guard.supervisor().root().display()
    );

    tokio::signal::ctrl_c().await?;
    println!();
    guard.stop()?;
    println!("{} Stopped watching", "✓".green());

    Ok(())
}

/// Register the entry and sub-unit source files of each plugin. Returns the
/// number of units registered.
pub fn register_source_units(
    units: &UnitRegistry,
    installed: &[InstalledPlugin],
    config: &HotReloadConfig,
) -> usize {
    let ext = config.source_extension.as_str();
    let mut count = 0;

    for plugin in installed {
        let entry = entry_file(&plugin.path, ext);

        let sub_units = SubUnit::ALL.iter().filter_map(|sub| {
            let path = plugin.path.join(format!("{sub}.{ext}"));
            path.is_file().then_some((Some(*sub), path))
        });

        for (sub, path) in entry.map(|path| (None, path)).into_iter().chain(sub_units) {
            let address = unit_address(&config.unit_namespace, &plugin.id, sub);
            match units.register(&address, Arc::new(source_builder(path))) {
                Ok(()) => count += 1,
                Err(e) => warn!("Skipping unit {}: {}", address, e),
            }
        }
    }

    count
}

/// Builds a unit by reading its source file
fn source_builder(path: PathBuf) -> impl Fn() -> PluginResult<UnitHandle> + Send + Sync {
    move || -> PluginResult<UnitHandle> {
        let source = fs::read_to_string(&path)?;
        Ok(Arc::new(source))
    }
}

/// Source text currently loaded for a unit
pub fn loaded_source(units: &UnitRegistry, address: &str) -> Option<Arc<String>> {
    units.current_as::<String>(address)
}
