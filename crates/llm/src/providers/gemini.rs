//! Google Gemini provider implementation.
//!
//! Gemini API: https://ai.google.dev/api/generate-content
//!
//! Structured output uses `responseJsonSchema` with an `application/json`
//! response MIME type. Reasoning models get a thinking budget derived from
//! the requested effort. Gemini has no verbosity control, so it is ignored.

use crate::catalog::ModelCatalog;
use crate::client::{
    parse_structured, ClientConfig, Completion, GenerationOutput, GenerationRequest, LlmClient,
    StructuredClient,
};
use crate::schema::strictify;
use crate::types::ReasoningEffort;
use crate::usage::UsageStats;
use scout_core::{AppError, AppResult};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const PROVIDER: &str = "gemini";

/// generateContent request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_json_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

/// Thinking token budget for a reasoning effort.
fn thinking_budget(effort: ReasoningEffort) -> u32 {
    match effort {
        ReasoningEffort::Low => 1024,
        ReasoningEffort::Medium => 8192,
        ReasoningEffort::High => 24576,
    }
}

/// Gemini generateContent client.
pub struct GeminiClient {
    config: ClientConfig,
    catalog: Arc<ModelCatalog>,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new client.
    pub fn new(config: ClientConfig, catalog: Arc<ModelCatalog>) -> Self {
        Self {
            config,
            catalog,
            client: reqwest::Client::new(),
        }
    }

    fn model_for<'a>(&'a self, request: &'a GenerationRequest) -> &'a str {
        let model = request
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.config.default_model);
        model.strip_prefix("models/").unwrap_or(model)
    }

    /// Build the request body. `schema` must already be strict.
    fn build_request(
        &self,
        request: &GenerationRequest,
        model: &str,
        schema: Option<Value>,
    ) -> GenerateContentRequest {
        let system_instruction = request
            .system_instruction
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(|system| Content {
                role: None,
                parts: vec![Part {
                    text: system.clone(),
                }],
            });

        let thinking_config = self.catalog.is_reasoning(model).then(|| ThinkingConfig {
            thinking_budget: thinking_budget(request.reasoning_effort),
        });

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_output_tokens,
                response_mime_type: schema.as_ref().map(|_| "application/json"),
                response_json_schema: schema,
                thinking_config,
            },
        }
    }

    async fn send(&self, api_key: &str, model: &str, body: &GenerateContentRequest) -> AppResult<Value> {
        let url = format!("{}/models/{}:generateContent", self.config.base_url, model);

        tracing::info!(model, "Sending request to Gemini");
        tracing::debug!("Request: {:?}", body);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Gemini: {}", e)))?;

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
            .map_err(|e| AppError::Llm(format!("Failed to parse Gemini response: {}", e)))
    }

    async fn run(&self, request: &GenerationRequest, schema: Option<&Value>) -> AppResult<Completion> {
        request.ensure_prompt()?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::MissingCredentials {
                provider: PROVIDER.to_string(),
            })?;

        let model = self.model_for(request);
        let body = self.build_request(request, model, schema.map(strictify));
        let payload = self.send(api_key, model, &body).await?;

        report_truncation(&payload);

        let usage = extract_usage(&payload);
        let text = extract_candidate_text(&payload).ok_or_else(|| AppError::EmptyResponse {
            provider: PROVIDER.to_string(),
        })?;

        tracing::info!("Received completion from Gemini");

        let output = match schema {
            Some(_) => parse_structured(PROVIDER, text),
            None => GenerationOutput::Text(text),
        };

        Ok(Completion { output, usage })
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
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
impl StructuredClient for GeminiClient {
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

/// Concatenate the text parts of the first candidate, skipping thoughts.
pub(crate) fn extract_candidate_text(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter(|part| part.get("thought").and_then(Value::as_bool) != Some(true))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    (!text.is_empty()).then_some(text)
}

/// Map `usageMetadata` to [`UsageStats`]; missing counters are 0.
pub(crate) fn extract_usage(payload: &Value) -> Option<UsageStats> {
    let usage = payload.get("usageMetadata").filter(|u| u.is_object())?;

    let counter = |key: &str| usage.get(key).and_then(Value::as_u64).unwrap_or(0);

    Some(UsageStats::new(
        counter("promptTokenCount"),
        counter("candidatesTokenCount"),
        counter("thoughtsTokenCount"),
    ))
}

/// Warn on token-limit truncation or a blocked prompt.
fn report_truncation(payload: &Value) {
    let finish_reason = payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .and_then(|c| c.get("finishReason"))
        .and_then(Value::as_str);

    if finish_reason == Some("MAX_TOKENS") {
        tracing::warn!(
            provider = PROVIDER,
            reason = "MAX_TOKENS",
            "Response is incomplete; output may be truncated"
        );
    }

    if let Some(reason) = payload
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(Value::as_str)
    {
        tracing::warn!(provider = PROVIDER, reason, "Prompt was blocked by Gemini");
    }
}
