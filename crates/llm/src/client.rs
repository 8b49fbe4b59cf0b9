//! LLM client abstraction and request/response types.
//!
//! This module defines the capability traits every provider implements and
//! the request, completion and result envelopes shared by all providers.

use crate::types::{ProviderName, ReasoningEffort, Verbosity};
use crate::usage::UsageStats;
use scout_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Output token cap used when a request does not set one.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 16_000;

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

/// A single generation request.
///
/// Owned by the caller; clients only borrow it for the duration of a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// User prompt (required, non-empty)
    pub prompt: String,

    /// System/developer instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// JSON Schema the output must conform to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<Value>,

    /// Provider override (falls back to the configured default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Model override (falls back to the provider's default model)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Maximum tokens to generate
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Reasoning depth, applied to reasoning models only
    #[serde(default)]
    pub reasoning_effort: ReasoningEffort,

    /// Output length preference
    #[serde(default)]
    pub verbosity: Verbosity,

    /// Name of the calling agent, used for logging and schema naming
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
}

impl GenerationRequest {
    /// Create a request with the default knobs.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
            json_schema: None,
            provider: None,
            model: None,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            reasoning_effort: ReasoningEffort::default(),
            verbosity: Verbosity::default(),
            agent_name: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_instruction = Some(system.into());
        self
    }

    /// Request structured output conforming to `schema`.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.json_schema = Some(schema);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = effort;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_agent_name(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = Some(agent_name.into());
        self
    }

    /// Fail with `MissingPrompt` if the prompt is blank.
    pub fn ensure_prompt(&self) -> AppResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(AppError::MissingPrompt);
        }
        Ok(())
    }
}

/// Completion payload.
///
/// Serialized untagged: text variants become a JSON string, parsed output
/// stays a JSON value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GenerationOutput {
    /// Free-text completion
    Text(String),

    /// Structured completion that parsed as JSON
    Json(Value),

    /// Structured completion that did not parse; raw text kept as-is
    Unparsed(String),
}

impl GenerationOutput {
    /// Raw text of `Text` and `Unparsed` outputs.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Unparsed(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    /// Parsed value of a `Json` output.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Whether a structured request degraded to raw text.
    pub fn is_unparsed(&self) -> bool {
        matches!(self, Self::Unparsed(_))
    }
}

/// What a provider client returns for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub output: GenerationOutput,
    pub usage: Option<UsageStats>,
}

/// What the router returns for one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// Provider that served the call
    pub provider: ProviderName,

    /// Parsed object or raw completion text
    pub output: GenerationOutput,

    /// Token usage, when the provider reported it
    pub usage: Option<UsageStats>,
}

/// Parse a structured completion, degrading to raw text on failure.
pub(crate) fn parse_structured(provider: &str, text: String) -> GenerationOutput {
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => GenerationOutput::Json(value),
        Err(e) => {
            tracing::warn!(
                provider,
                error = %e,
                "Structured output is not valid JSON; returning raw text"
            );
            GenerationOutput::Unparsed(text)
        }
    }
}

/// Connection settings a provider client is built with.
#[derive(Clone, Default)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
}

impl ClientConfig {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_model: default_model.into(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Free-text generation capability.
///
/// Implementations are shared across concurrent calls and must not keep
/// per-call state.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "openai", "gemini").
    fn provider_name(&self) -> &str;

    /// Model used when a request does not name one.
    fn default_model(&self) -> &str;

    /// Generate a free-text completion.
    ///
    /// # Errors
    /// `MissingPrompt`, `MissingCredentials`, `ProviderHttp`,
    /// `EmptyResponse`, or `Llm` on transport failure.
    async fn generate_content(&self, request: &GenerationRequest) -> AppResult<Completion>;
}

/// Schema-constrained generation capability.
#[async_trait::async_trait]
pub trait StructuredClient: LlmClient {
    /// Generate output conforming to `request.json_schema`.
    ///
    /// Output that fails to parse is returned as
    /// [`GenerationOutput::Unparsed`] rather than as an error.
    ///
    /// # Errors
    /// As [`LlmClient::generate_content`], plus `SchemaRequired`.
    async fn generate_structured(&self, request: &GenerationRequest) -> AppResult<Completion>;
}

/// A provider client tagged with its capability set.
#[derive(Clone)]
pub enum ProviderClient {
    TextOnly(Arc<dyn LlmClient>),
    TextAndStructured(Arc<dyn StructuredClient>),
}

impl ProviderClient {
    pub fn provider_name(&self) -> &str {
        match self {
            Self::TextOnly(client) => client.provider_name(),
            Self::TextAndStructured(client) => client.provider_name(),
        }
    }

    pub fn default_model(&self) -> &str {
        match self {
            Self::TextOnly(client) => client.default_model(),
            Self::TextAndStructured(client) => client.default_model(),
        }
    }

    pub fn supports_structured(&self) -> bool {
        matches!(self, Self::TextAndStructured(_))
    }

    /// Dispatch a request.
    ///
    /// Structured generation runs only when the request carries a schema and
    /// the client supports it; otherwise the schema is ignored and free text
    /// is generated.
    pub async fn generate(&self, request: &GenerationRequest) -> AppResult<Completion> {
        match self {
            Self::TextAndStructured(client) if request.json_schema.is_some() => {
                client.generate_structured(request).await
            }
            Self::TextAndStructured(client) => client.generate_content(request).await,
            Self::TextOnly(client) => {
                if request.json_schema.is_some() {
                    tracing::debug!(
                        provider = client.provider_name(),
                        "Provider has no structured mode; ignoring JSON schema"
                    );
                }
                client.generate_content(request).await
            }
        }
    }
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Self::TextOnly(_) => "TextOnly",
            Self::TextAndStructured(_) => "TextAndStructured",
        };
        f.debug_tuple(variant).field(&self.provider_name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request = GenerationRequest::new("Score this resume");
        assert_eq!(request.max_output_tokens, 16_000);
        assert_eq!(request.reasoning_effort, ReasoningEffort::Medium);
        assert_eq!(request.verbosity, Verbosity::Low);
        assert!(request.json_schema.is_none());
    }

    #[test]
    fn test_request_deserialize_defaults() {
        let request: GenerationRequest =
            serde_json::from_value(json!({ "prompt": "hi", "agentName": "resume-scorer" })).unwrap();
        assert_eq!(request.max_output_tokens, DEFAULT_MAX_OUTPUT_TOKENS);
        assert_eq!(request.agent_name.as_deref(), Some("resume-scorer"));
    }

    #[test]
    fn test_ensure_prompt() {
        assert!(GenerationRequest::new("hello").ensure_prompt().is_ok());
        assert!(matches!(
            GenerationRequest::new("").ensure_prompt(),
            Err(AppError::MissingPrompt)
        ));
        assert!(matches!(
            GenerationRequest::new("  \n").ensure_prompt(),
            Err(AppError::MissingPrompt)
        ));
    }

    #[test]
    fn test_parse_structured() {
        let parsed = parse_structured("openai", r#"{"score": 7}"#.to_string());
        assert_eq!(parsed.as_json(), Some(&json!({ "score": 7 })));

        let degraded = parse_structured("openai", "{not json".to_string());
        assert!(degraded.is_unparsed());
        assert_eq!(degraded.as_text(), Some("{not json"));
    }

    #[test]
    fn test_output_serializes_loosely() {
        let result = GenerationResult {
            provider: ProviderName::OpenAI,
            output: GenerationOutput::Unparsed("{not json".to_string()),
            usage: None,
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "provider": "openai", "output": "{not json", "usage": null })
        );

        let parsed = GenerationOutput::Json(json!({ "fit": true }));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), json!({ "fit": true }));
    }

    #[test]
    fn test_client_config_trims_base_url_and_redacts_key() {
        let config = ClientConfig::new(Some("sk-secret".to_string()), "http://host/v1/", "m");
        assert_eq!(config.base_url, "http://host/v1");
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
