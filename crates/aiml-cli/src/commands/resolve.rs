//! `aiml resolve` command implementation

use aiml_plugins::EnabledSet;

use crate::CliError;
use crate::context::CliContext;
use crate::output::format_data;

/// Execute the `aiml resolve` command
///
/// Without a usable token the registry's default enablement applies.
pub fn run(ctx: &CliContext, token: Option<&str>) -> Result<(), CliError> {
    let enabled: EnabledSet = ctx.registry.enabled_from_token(token).into_iter().collect();
    let resolved = ctx.registry.resolve(Some(&enabled));

    println!("{}", format_data(&resolved, ctx.format)?);
    Ok(())
}
