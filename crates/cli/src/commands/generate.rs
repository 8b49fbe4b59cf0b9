//! Generate command handler.
//!
//! Sends one free-text or schema-constrained request through the router.

use super::{print_json, read_json_file};
use clap::Args;
use scout_core::{AppError, AppResult};
use scout_llm::{GenerationRequest, LlmRouter, ReasoningEffort, Verbosity};
use std::path::PathBuf;

/// Generate a completion
#[derive(Args, Debug)]
pub struct GenerateCommand {
    /// The prompt text
    pub prompt: Option<String>,

    /// Read prompt from file
    #[arg(short, long, conflicts_with = "prompt")]
    pub file: Option<PathBuf>,

    /// System instruction
    #[arg(short, long)]
    pub system: Option<String>,

    /// JSON Schema file; the output must conform to it
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Maximum tokens in the response
    #[arg(long)]
    pub max_output_tokens: Option<u32>,

    /// Reasoning effort for reasoning models (low, medium, high)
    #[arg(long)]
    pub reasoning_effort: Option<ReasoningEffort>,

    /// Output length preference (low, medium, high)
    #[arg(long)]
    pub verbosity: Option<Verbosity>,

    /// Agent name used in logs and as the schema format name
    #[arg(long)]
    pub agent: Option<String>,
}

impl GenerateCommand {
    /// Execute the generate command.
    pub async fn execute(
        &self,
        router: &LlmRouter,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> AppResult<()> {
        tracing::info!("Executing generate command");
        tracing::debug!("Generate command options: {:?}", self);

        let request = self.build_request(provider, model)?;
        let result = router.generate(&request).await?;

        if let Some(ref usage) = result.usage {
            tracing::debug!(
                "Token usage - Prompt: {}, Completion: {}, Reasoning: {}, Total: {}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.reasoning_tokens,
                usage.total_tokens
            );
        }

        print_json(&result)
    }

    /// Assemble the request from flags and files.
    pub fn build_request(
        &self,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> AppResult<GenerationRequest> {
        let mut request = GenerationRequest::new(self.get_prompt()?);

        if let Some(ref system) = self.system {
            request = request.with_system(system.as_str());
        }
        if let Some(ref path) = self.schema {
            request = request.with_schema(read_json_file(path)?);
        }
        if let Some(provider) = provider {
            request = request.with_provider(provider);
        }
        if let Some(model) = model {
            request = request.with_model(model);
        }
        if let Some(max_output_tokens) = self.max_output_tokens {
            request = request.with_max_output_tokens(max_output_tokens);
        }
        if let Some(effort) = self.reasoning_effort {
            request = request.with_reasoning_effort(effort);
        }
        if let Some(verbosity) = self.verbosity {
            request = request.with_verbosity(verbosity);
        }
        if let Some(ref agent) = self.agent {
            request = request.with_agent_name(agent.as_str());
        }

        Ok(request)
    }

    /// Get the prompt text from the argument or the prompt file.
    ///
    /// A missing prompt is left for the router to reject.
    fn get_prompt(&self) -> AppResult<String> {
        match (&self.prompt, &self.file) {
            (Some(prompt), _) => Ok(prompt.clone()),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("Failed to read prompt file {:?}: {}", path, e))
            }),
            (None, None) => Ok(String::new()),
        }
    }
}
