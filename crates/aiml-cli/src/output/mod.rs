//! Output formatting module
//!
//! Renders command results as text, JSON or tables.

use serde::Serialize;
use serde_json::Value;

use crate::CliError;

mod table;

pub use table::Table;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for automation
    Json,
    /// Table-formatted output
    Table,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Table => write!(f, "table"),
        }
    }
}

/// Format structured data for display. Text is pretty-printed JSON.
pub fn format_data<T: Serialize>(data: &T, format: OutputFormat) -> Result<String, CliError> {
    let json = serde_json::to_value(data)?;
    match format {
        OutputFormat::Text => Ok(serde_json::to_string_pretty(&json)?),
        OutputFormat::Json => Ok(json.to_string()),
        OutputFormat::Table => Ok(format_table(&json)),
    }
}

fn format_table(json: &Value) -> String {
    if let Some(arr) = json.as_array()
        && !arr.is_empty()
    {
        return Table::from_json_array(arr).to_string();
    }
    // Fallback to JSON
    json.to_string()
}
