//! Command handlers for the Scout CLI.

pub mod generate;
pub mod providers;
pub mod strictify;

pub use generate::GenerateCommand;
pub use providers::ProvidersCommand;
pub use strictify::StrictifyCommand;

use scout_core::{AppError, AppResult};
use std::path::Path;

/// Read a JSON document from disk.
pub(crate) fn read_json_file(path: &Path) -> AppResult<serde_json::Value> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read {:?}: {}", path, e)))?;

    serde_json::from_str(&contents)
        .map_err(|e| AppError::Serialization(format!("Invalid JSON in {:?}: {}", path, e)))
}

/// Pretty-print a value to stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
