//! `aiml token` command implementation

use aiml_plugins::{decode_enabled, encode_enabled};
use serde_json::json;

use crate::CliError;
use crate::output::{OutputFormat, format_data};

/// Execute the `aiml token encode` command
pub fn run_encode(ids: &[String], format: OutputFormat) -> Result<(), CliError> {
    let token = encode_enabled(ids);
    match format {
        OutputFormat::Text => println!("{token}"),
        _ => println!("{}", format_data(&json!({ "token": token }), format)?),
    }
    Ok(())
}

/// Execute the `aiml token decode` command
pub fn run_decode(token: &str, format: OutputFormat) -> Result<(), CliError> {
    let ids = decode_enabled(Some(token)).ok_or(CliError::InvalidToken)?;
    match format {
        OutputFormat::Text => {
            for id in &ids {
                println!("{id}");
            }
        }
        OutputFormat::Json => println!("{}", format_data(&ids, format)?),
        OutputFormat::Table => {
            let rows: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();
            println!("{}", format_data(&rows, format)?);
        }
    }
    Ok(())
}
