//! LLM provider factory.
//!
//! Builds provider clients from configuration. Construction never performs
//! network access and never fails: a missing API key is reported by the
//! client when it is first asked to generate.

use crate::catalog::ModelCatalog;
use crate::client::{ClientConfig, ProviderClient};
use crate::providers::{GeminiClient, OpenAiClient};
use crate::types::ProviderName;
use scout_core::config::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL,
};
use scout_core::LlmSettings;
use std::sync::Arc;

/// Resolve connection settings for a provider.
///
/// The API key comes from the explicit setting or the environment variable
/// named by `apiKeyEnv`; base URL and model fall back to built-in defaults.
pub fn client_config(provider: ProviderName, settings: &LlmSettings) -> ClientConfig {
    let provider_settings = settings.provider(provider.as_str());

    let (default_base_url, default_model) = match provider {
        ProviderName::OpenAI => (DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL),
        ProviderName::Gemini => (DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL),
    };

    ClientConfig::new(
        provider_settings.resolve_api_key(),
        provider_settings
            .base_url
            .unwrap_or_else(|| default_base_url.to_string()),
        provider_settings
            .model
            .unwrap_or_else(|| default_model.to_string()),
    )
}

/// Create the client for a provider.
pub fn create_client(
    provider: ProviderName,
    settings: &LlmSettings,
    catalog: Arc<ModelCatalog>,
) -> ProviderClient {
    let config = client_config(provider, settings);

    tracing::debug!(
        provider = %provider,
        base_url = %config.base_url,
        model = %config.default_model,
        has_api_key = config.api_key.is_some(),
        "Creating LLM client"
    );

    match provider {
        ProviderName::OpenAI => {
            ProviderClient::TextAndStructured(Arc::new(OpenAiClient::new(config, catalog)))
        }
        ProviderName::Gemini => {
            ProviderClient::TextAndStructured(Arc::new(GeminiClient::new(config, catalog)))
        }
    }
}
