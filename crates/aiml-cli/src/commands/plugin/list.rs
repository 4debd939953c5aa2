//! `aiml plugin list` command implementation

use aiml_kernel::plugin::Marketplace;
use colored::Colorize;
use serde::Serialize;

use crate::CliError;
use crate::context::CliContext;
use crate::output::{OutputFormat, format_data};

/// Execute the `aiml plugin list` command
pub fn run(ctx: &CliContext) -> Result<(), CliError> {
    let installed = ctx.marketplace().list_installed(ctx.plugins_root());

    let infos: Vec<PluginInfo> = installed
        .iter()
        .map(|plugin| {
            let metadata = ctx.registry.get(&plugin.id);
            PluginInfo {
                id: plugin.id.clone(),
                name: metadata
                    .map(|m| m.name.clone())
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| plugin.name.clone()),
                version: metadata.map(|m| m.version.clone()).unwrap_or_default(),
                locked: metadata.is_some_and(|m| m.locked),
                registered: metadata.is_some(),
                path: plugin.path.display().to_string(),
            }
        })
        .collect();

    if ctx.format != OutputFormat::Text {
        println!("{}", format_data(&infos, ctx.format)?);
        return Ok(());
    }

    println!(
        "{} Plugins in {}",
        "→".green(),
        ctx.plugins_root().display()
    );
    println!();

    if infos.is_empty() {
        println!("  No plugins installed.");
        return Ok(());
    }

    println!("{}", format_data(&infos, OutputFormat::Table)?);
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
struct PluginInfo {
    id: String,
    name: String,
    version: String,
    locked: bool,
    registered: bool,
    path: String,
}
