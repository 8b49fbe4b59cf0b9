//! LLM router.
//!
//! [`LlmRouter`] is the single entry point for generation. It resolves the
//! provider for a request, builds that provider's client on first use,
//! dispatches to structured or free-text generation and wraps the result in
//! a [`GenerationResult`].
//!
//! The router is an explicit registry: the application builds one at start
//! up and passes it to whatever issues generation calls. It is `Send + Sync`
//! and can be shared behind an `Arc`.

use crate::catalog::ModelCatalog;
use crate::client::{GenerationRequest, GenerationResult, ProviderClient};
use crate::factory::create_client;
use crate::types::ProviderName;
use crate::usage::UsageLedger;
use scout_core::{AppError, AppResult, LlmSettings};
use std::sync::{Arc, OnceLock};
use tracing::Instrument;

/// Provider-resolving, client-caching facade over all providers.
#[derive(Debug)]
pub struct LlmRouter {
    settings: LlmSettings,
    catalog: Arc<ModelCatalog>,
    openai: OnceLock<ProviderClient>,
    gemini: OnceLock<ProviderClient>,
    ledger: UsageLedger,
}

impl LlmRouter {
    /// Create a router. No client is built until it is first needed.
    pub fn new(settings: LlmSettings) -> Self {
        let catalog = Arc::new(ModelCatalog::from_settings(&settings));
        Self {
            settings,
            catalog,
            openai: OnceLock::new(),
            gemini: OnceLock::new(),
            ledger: UsageLedger::new(),
        }
    }

    /// Register a prebuilt client for a provider.
    ///
    /// Replaces whatever client the router would otherwise build.
    pub fn with_client(mut self, provider: ProviderName, client: ProviderClient) -> Self {
        *self.slot_mut(provider) = OnceLock::from(client);
        self
    }

    /// Configured settings.
    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// Model capability catalog shared with the clients.
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Usage recorded from every successful call.
    pub fn usage(&self) -> &UsageLedger {
        &self.ledger
    }

    /// Resolve the provider for a request: the explicit name, else the
    /// configured default.
    pub fn resolve_provider(&self, requested: Option<&str>) -> AppResult<ProviderName> {
        let name = requested
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(&self.settings.default_provider);

        ProviderName::parse(name).ok_or_else(|| AppError::UnsupportedProvider(name.to_string()))
    }

    /// Client for a provider, built on first use and reused afterwards.
    pub fn client(&self, provider: ProviderName) -> &ProviderClient {
        self.slot(provider).get_or_init(|| {
            tracing::info!(provider = %provider, "Initializing LLM client");
            create_client(provider, &self.settings, Arc::clone(&self.catalog))
        })
    }

    /// Run one generation request.
    ///
    /// # Errors
    /// `UnsupportedProvider` before any client is built, then whatever the
    /// provider client reports. Nothing is retried.
    pub async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResult> {
        let provider = self.resolve_provider(request.provider.as_deref())?;
        let client = self.client(provider);

        let model = effective_model(request, client);
        let span = tracing::info_span!(
            "generate",
            provider = %provider,
            model,
            agent = request.agent_name.as_deref().unwrap_or("-"),
            structured = request.json_schema.is_some() && client.supports_structured(),
        );

        let completion = client.generate(request).instrument(span).await?;

        self.ledger.record(provider, completion.usage.as_ref());

        Ok(GenerationResult {
            provider,
            output: completion.output,
            usage: completion.usage,
        })
    }

    fn slot(&self, provider: ProviderName) -> &OnceLock<ProviderClient> {
        match provider {
            ProviderName::OpenAI => &self.openai,
            ProviderName::Gemini => &self.gemini,
        }
    }

    fn slot_mut(&mut self, provider: ProviderName) -> &mut OnceLock<ProviderClient> {
        match provider {
            ProviderName::OpenAI => &mut self.openai,
            ProviderName::Gemini => &mut self.gemini,
        }
    }
}

/// Model a client will send for `request`; blank overrides are ignored.
fn effective_model<'a>(request: &'a GenerationRequest, client: &'a ProviderClient) -> &'a str {
    request
        .model
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| client.default_model())
}
