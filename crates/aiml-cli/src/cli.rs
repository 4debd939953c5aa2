//! CLI command definitions using clap

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// AIML CLI - Inspect plugin enablement and run development hot reload
#[derive(Parser)]
#[command(name = "aiml")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json, table)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<OutputFormat>,

    /// Host settings file (yaml, toml, json, ini, ron, json5)
    #[arg(short = 'c', long, global = true, env = "AIML_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Encode or decode enabled-plugin tokens
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },

    /// Show every known plugin with its effective enablement
    Resolve {
        /// Enabled-plugin token sent by a client
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Watch the plugins directory and reload plugins as they change
    Watch,

    /// Plugin management
    Plugin {
        #[command(subcommand)]
        action: PluginCommands,
    },
}

/// Token subcommands
#[derive(Subcommand)]
pub enum TokenCommands {
    /// Encode plugin ids into a token
    Encode {
        /// Enabled plugin ids
        ids: Vec<String>,
    },

    /// Decode a token into plugin ids
    Decode {
        /// Token to decode
        token: String,
    },
}

/// Plugin management subcommands
#[derive(Subcommand)]
pub enum PluginCommands {
    /// List plugins installed in the plugins directory
    List,

    /// Uninstall a plugin
    Uninstall {
        /// Plugin id
        id: String,

        /// Uninstall even if the plugin is locked
        #[arg(short, long)]
        force: bool,
    },

    /// Show a plugin's settings and check them against its schema
    Settings {
        /// Plugin id
        id: String,
    },
}
