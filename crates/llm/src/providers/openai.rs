//! OpenAI Responses API provider implementation.
//!
//! API reference: https://platform.openai.com/docs/api-reference/responses
//!
//! Requests go to `POST {base_url}/responses`. The completion text is located
//! through an ordered fallback chain because the payload carries it in
//! several, partially redundant places.

use crate::catalog::ModelCatalog;
use crate::client::{
    parse_structured, ClientConfig, Completion, GenerationOutput, GenerationRequest, LlmClient,
    StructuredClient,
};
use crate::schema::strictify;
use crate::types::{ReasoningEffort, Verbosity};
use crate::usage::UsageStats;
use scout_core::{AppError, AppResult};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const PROVIDER: &str = "openai";

/// Format name used when the request carries no agent name.
const DEFAULT_FORMAT_NAME: &str = "structured_output";

/// Responses API request body.
#[derive(Debug, Clone, Serialize)]
struct ResponsesRequest {
    model: String,
    input: Vec<InputMessage>,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<ReasoningOptions>,
}

#[derive(Debug, Clone, Serialize)]
struct InputMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct TextOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<JsonSchemaFormat>,
    verbosity: Verbosity,
}

#[derive(Debug, Clone, Serialize)]
struct JsonSchemaFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    name: String,
    strict: bool,
    schema: Value,
}

#[derive(Debug, Clone, Serialize)]
struct ReasoningOptions {
    effort: ReasoningEffort,
}

/// OpenAI Responses API client.
pub struct OpenAiClient {
    config: ClientConfig,

    /// Decides which models receive reasoning controls
    catalog: Arc<ModelCatalog>,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client.
    pub fn new(config: ClientConfig, catalog: Arc<ModelCatalog>) -> Self {
        Self {
            config,
            catalog,
            client: reqwest::Client::new(),
        }
    }

    /// Whether `model` receives a `reasoning.effort` control.
    pub fn is_reasoning_model(&self, model: &str) -> bool {
        self.catalog.is_reasoning(model)
    }

    fn model_for<'a>(&'a self, request: &'a GenerationRequest) -> &'a str {
        request
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.config.default_model)
    }

    /// Build the request body. `schema` must already be strict.
    fn build_request(&self, request: &GenerationRequest, schema: Option<Value>) -> ResponsesRequest {
        let model = self.model_for(request).to_string();

        let mut input = Vec::with_capacity(2);
        if let Some(system) = request.system_instruction.as_ref().filter(|s| !s.is_empty()) {
            input.push(InputMessage {
                role: "developer",
                content: system.clone(),
            });
        }
        input.push(InputMessage {
            role: "user",
            content: request.prompt.clone(),
        });

        let format = schema.map(|schema| JsonSchemaFormat {
            kind: "json_schema",
            name: format_name(request.agent_name.as_deref()),
            strict: true,
            schema,
        });

        let reasoning = self
            .is_reasoning_model(&model)
            .then_some(ReasoningOptions {
                effort: request.reasoning_effort,
            });

        ResponsesRequest {
            model,
            input,
            max_output_tokens: request.max_output_tokens,
            text: Some(TextOptions {
                format,
                verbosity: request.verbosity,
            }),
            reasoning,
        }
    }

    fn api_key(&self) -> AppResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::MissingCredentials {
                provider: PROVIDER.to_string(),
            })
    }

    /// POST the body and return the decoded success payload.
    async fn send(&self, api_key: &str, body: &ResponsesRequest) -> AppResult<Value> {
        let url = format!("{}/responses", self.config.base_url);

        tracing::info!(model = %body.model, "Sending request to OpenAI Responses API");
        tracing::debug!("Request: {:?}", body);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to OpenAI: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ProviderHttp {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse OpenAI response: {}", e)))
    }

    async fn run(&self, request: &GenerationRequest, schema: Option<&Value>) -> AppResult<Completion> {
        request.ensure_prompt()?;
        let api_key = self.api_key()?;

        let body = self.build_request(request, schema.map(strictify));
        let payload = self.send(api_key, &body).await?;

        report_incomplete(&payload);

        let usage = extract_usage(&payload);
        let text = extract_output_text(&payload).ok_or_else(|| AppError::EmptyResponse {
            provider: PROVIDER.to_string(),
        })?;

        tracing::info!("Received completion from OpenAI");
        if let Some(ref usage) = usage {
            tracing::debug!(
                "Token usage - Prompt: {}, Completion: {}, Reasoning: {}, Total: {}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.reasoning_tokens,
                usage.total_tokens
            );
        }

        let output = match schema {
            Some(_) => parse_structured(PROVIDER, text),
            None => GenerationOutput::Text(text),
        };

        Ok(Completion { output, usage })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn generate_content(&self, request: &GenerationRequest) -> AppResult<Completion> {
        self.run(request, None).await
    }
}

#[async_trait::async_trait]
impl StructuredClient for OpenAiClient {
    async fn generate_structured(&self, request: &GenerationRequest) -> AppResult<Completion> {
        let schema = request
            .json_schema
            .as_ref()
            .ok_or_else(|| AppError::SchemaRequired {
                provider: PROVIDER.to_string(),
            })?;
        self.run(request, Some(schema)).await
    }
}

/// Schema format name: the agent name restricted to `[A-Za-z0-9_-]`, at
/// most 64 characters.
fn format_name(agent_name: Option<&str>) -> String {
    let name: String = agent_name
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect();

    if name.trim_matches('_').is_empty() {
        DEFAULT_FORMAT_NAME.to_string()
    } else {
        name
    }
}

/// Locate the completion text. First non-empty match wins:
/// 1. the `message` entries of `output`, whose `content` is a string or a
///    list of parts (only `output_text` parts are kept, in order)
/// 2. top-level `output_text`
/// 3. `text.content`
pub(crate) fn extract_output_text(payload: &Value) -> Option<String> {
    if let Some(items) = payload.get("output").and_then(Value::as_array) {
        let from_messages = items
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("message"))
            .filter_map(message_text)
            .find(|text| !text.is_empty());
        if from_messages.is_some() {
            return from_messages;
        }
    }

    if let Some(text) = payload
        .get("output_text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
    {
        return Some(text.to_string());
    }

    payload
        .get("text")
        .and_then(|t| t.get("content"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn message_text(message: &Value) -> Option<String> {
    match message.get("content")? {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => Some(
            parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect(),
        ),
        _ => None,
    }
}

/// Map `usage` to [`UsageStats`]; missing counters are 0.
pub(crate) fn extract_usage(payload: &Value) -> Option<UsageStats> {
    let usage = payload.get("usage").filter(|u| u.is_object())?;

    let counter = |value: Option<&Value>| value.and_then(Value::as_u64);

    let input = counter(usage.get("input_tokens")).unwrap_or(0);
    let output = counter(usage.get("output_tokens")).unwrap_or(0);
    let reasoning = counter(usage.get("reasoning_tokens"))
        .or_else(|| {
            counter(
                usage
                    .get("output_tokens_details")
                    .and_then(|d| d.get("reasoning_tokens")),
            )
        })
        .unwrap_or(0);

    Some(UsageStats::new(input, output, reasoning))
}

/// Warn when the provider stopped before finishing the completion.
fn report_incomplete(payload: &Value) {
    let status_incomplete = payload.get("status").and_then(Value::as_str) == Some("incomplete");
    let details = payload
        .get("incomplete_details")
        .filter(|d| !d.is_null());

    if status_incomplete || details.is_some() {
        let reason = details
            .and_then(|d| d.get("reason"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        tracing::warn!(
            provider = PROVIDER,
            reason,
            "Response is incomplete; output may be truncated"
        );
    }
}
