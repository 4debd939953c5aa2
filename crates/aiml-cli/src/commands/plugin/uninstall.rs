//! `aiml plugin uninstall` command implementation

use aiml_kernel::plugin::Marketplace;
use colored::Colorize;

use crate::CliError;
use crate::context::CliContext;

/// Execute the `aiml plugin uninstall` command
pub fn run(ctx: &CliContext, id: &str, force: bool) -> Result<(), CliError> {
    println!("{} Uninstalling plugin: {}", "→".green(), id.cyan());

    if !force && ctx.registry.get(id).is_some_and(|p| p.locked) {
        return Err(CliError::PluginError(format!(
            "Plugin '{id}' is locked; use --force to uninstall it anyway"
        )));
    }

    let dir = ctx.plugin_dir(id)?;
    let outcome = ctx.marketplace().uninstall_plugin(&dir);
    if !outcome.success {
        return Err(CliError::PluginError(outcome.message));
    }

    println!("{} Plugin '{}' uninstalled", "✓".green(), id);
    Ok(())
}
