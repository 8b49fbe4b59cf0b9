//! Scout CLI
//!
//! Main entry point for the scout command-line tool.
//! Sends free-text and schema-constrained generation requests to
//! OpenAI or Gemini through a single interface.

mod commands;

use clap::{Parser, Subcommand};
use commands::{GenerateCommand, ProvidersCommand, StrictifyCommand};
use scout_core::{config::AppConfig, logging, AppResult, LogFormat};
use scout_llm::LlmRouter;
use std::path::PathBuf;

/// Scout - one interface for OpenAI and Gemini generation
#[derive(Parser, Debug)]
#[command(name = "scout")]
#[command(about = "Provider-agnostic LLM generation", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "SCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// LLM provider (openai, gemini)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "SCOUT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate free text, or JSON conforming to a schema
    Generate(GenerateCommand),

    /// Print the strict form of a JSON Schema
    Strictify(StrictifyCommand),

    /// List supported providers and their settings
    Providers(ProvidersCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // File and environment first, then CLI overrides
    let config = AppConfig::load_from(cli.config.clone())?.with_overrides(
        cli.provider.clone(),
        cli.log_level.clone(),
        cli.log_format.clone(),
        cli.verbose,
        cli.no_color,
    );

    let log_format = match config.log_format.as_deref() {
        Some(format) => format.parse::<LogFormat>()?,
        None => LogFormat::default(),
    };
    logging::init_logging(config.log_level.as_deref(), config.no_color, log_format)?;

    tracing::info!("Scout CLI starting");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Default provider: {}", config.llm.default_provider);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Generate(_) => "generate",
        Commands::Strictify(_) => "strictify",
        Commands::Providers(_) => "providers",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Generate(cmd) => {
            let router = LlmRouter::new(config.llm);
            cmd.execute(&router, cli.provider.as_deref(), cli.model.as_deref())
                .await
        }
        Commands::Strictify(cmd) => cmd.execute().await,
        Commands::Providers(cmd) => cmd.execute(&config.llm).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
