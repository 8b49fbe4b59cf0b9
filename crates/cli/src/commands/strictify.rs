//! Strictify command handler.

use super::{print_json, read_json_file};
use clap::Args;
use scout_core::AppResult;
use scout_llm::strictify;
use std::path::PathBuf;

/// Print the strict form of a JSON Schema file
#[derive(Args, Debug)]
pub struct StrictifyCommand {
    /// Path to the JSON Schema file
    pub file: PathBuf,
}

impl StrictifyCommand {
    pub async fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing strictify command");

        let schema = read_json_file(&self.file)?;
        print_json(&strictify(&schema))
    }
}
