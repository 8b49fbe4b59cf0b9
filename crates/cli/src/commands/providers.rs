//! Providers command handler.
//!
//! Lists the supported providers with their resolved connection settings.

use super::print_json;
use clap::Args;
use scout_core::{AppResult, LlmSettings};
use scout_llm::{client_config, ProviderName};
use serde_json::{json, Value};

/// List supported providers
#[derive(Args, Debug)]
pub struct ProvidersCommand {}

impl ProvidersCommand {
    pub async fn execute(&self, settings: &LlmSettings) -> AppResult<()> {
        tracing::info!("Executing providers command");
        print_json(&provider_summary(settings))
    }
}

/// Summary of every provider. Keys are reported as present or absent only.
pub fn provider_summary(settings: &LlmSettings) -> Value {
    let providers: Vec<Value> = ProviderName::ALL
        .iter()
        .map(|&provider| {
            let config = client_config(provider, settings);
            json!({
                "name": provider.as_str(),
                "default": ProviderName::parse(&settings.default_provider) == Some(provider),
                "baseUrl": config.base_url,
                "defaultModel": config.default_model,
                "apiKeyResolved": config.api_key.is_some(),
            })
        })
        .collect();

    json!({ "providers": providers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::ProviderSettings;

    #[test]
    fn test_summary_never_contains_keys() {
        let mut settings = LlmSettings::default();
        settings.providers.insert(
            "openai".to_string(),
            ProviderSettings {
                api_key: Some("sk-secret-value".to_string()),
                api_key_env: None,
                base_url: Some("https://proxy.example.com/v1".to_string()),
                model: Some("gpt-5".to_string()),
            },
        );

        let summary = provider_summary(&settings);
        assert!(!summary.to_string().contains("sk-secret-value"));

        let openai = &summary["providers"][0];
        assert_eq!(openai["name"], "openai");
        assert_eq!(openai["default"], true);
        assert_eq!(openai["baseUrl"], "https://proxy.example.com/v1");
        assert_eq!(openai["defaultModel"], "gpt-5");
        assert_eq!(openai["apiKeyResolved"], true);

        let gemini = &summary["providers"][1];
        assert_eq!(gemini["name"], "gemini");
        assert_eq!(gemini["default"], false);
        assert_eq!(gemini["defaultModel"], "gemini-2.5-flash");
    }
}
