//! `aiml plugin settings` command implementation

use aiml_plugins::PluginSettingsStore;
use colored::Colorize;
use serde_json::{Value, json};

use crate::CliError;
use crate::context::CliContext;
use crate::output::{OutputFormat, format_data};

/// Execute the `aiml plugin settings` command
pub fn run(ctx: &CliContext, id: &str) -> Result<(), CliError> {
    let store = ctx.settings_store()?;
    let settings = store.load(id)?;

    let problems = match ctx.registry.get(id) {
        Some(metadata) => PluginSettingsStore::validate(metadata, &settings),
        None => Vec::new(),
    };

    if ctx.format != OutputFormat::Text {
        let report = json!({
            "id": id,
            "settings": Value::Object(settings),
            "valid": problems.is_empty(),
            "problems": problems,
        });
        println!("{}", format_data(&report, ctx.format)?);
        return Ok(());
    }

    println!("{} Settings for plugin {}", "→".green(), id.cyan());
    println!("{}", format_data(&settings, OutputFormat::Text)?);

    if problems.is_empty() {
        println!("{} Settings are valid", "✓".green());
    } else {
        for problem in &problems {
            println!("{} {}", "✗".red(), problem);
        }
    }
    Ok(())
}
