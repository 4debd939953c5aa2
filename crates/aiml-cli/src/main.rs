//! AIML CLI - Inspect plugin enablement and run development hot reload

mod cli;
mod commands;
mod context;
mod error;
mod output;

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use context::CliContext;
pub use error::CliError;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    if let Err(e) = rt.block_on(run_command(cli)) {
        eprintln!("{} {}", "✗".red(), e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run_command(cli: Cli) -> anyhow::Result<()> {
    use cli::{Commands, PluginCommands, TokenCommands};

    let format = cli.output.unwrap_or_default();

    match cli.command {
        Commands::Token { action } => match action {
            TokenCommands::Encode { ids } => commands::token::run_encode(&ids, format)?,
            TokenCommands::Decode { token } => commands::token::run_decode(&token, format)?,
        },

        Commands::Resolve { token } => {
            let ctx = CliContext::load(cli.config.as_deref(), format)?;
            commands::resolve::run(&ctx, token.as_deref())?;
        }

        Commands::Watch => {
            let ctx = CliContext::load(cli.config.as_deref(), format)?;
            commands::watch::run(&ctx).await?;
        }

        Commands::Plugin { action } => {
            let ctx = CliContext::load(cli.config.as_deref(), format)?;
            match action {
                PluginCommands::List => commands::plugin::list::run(&ctx)?,
                PluginCommands::Uninstall { id, force } => {
                    commands::plugin::uninstall::run(&ctx, &id, force)?
                }
                PluginCommands::Settings { id } => commands::plugin::settings::run(&ctx, &id)?,
            }
        }
    }

    Ok(())
}
