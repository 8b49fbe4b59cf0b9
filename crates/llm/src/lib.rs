//! LLM integration crate for Scout.
//!
//! This crate provides a provider-agnostic facade for free-text and
//! JSON-schema-constrained generation. Providers speak incompatible wire
//! protocols; callers only see [`GenerationRequest`] and [`GenerationResult`].
//!
//! # Providers
//! - **OpenAI**: Responses API, with reasoning and verbosity controls
//! - **Gemini**: generateContent API
//!
//! # Example
//! ```no_run
//! use scout_core::LlmSettings;
//! use scout_llm::{GenerationRequest, LlmRouter};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let router = LlmRouter::new(LlmSettings::default());
//! let request = GenerationRequest::new("Extract the candidate's name")
//!     .with_schema(json!({
//!         "type": "object",
//!         "properties": { "name": { "type": "string" } }
//!     }))
//!     .with_agent_name("resume-parser");
//!
//! let result = router.generate(&request).await?;
//! match result.output.as_json() {
//!     Some(value) => println!("{}", value["name"]),
//!     None => println!("unparsed: {:?}", result.output.as_text()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod factory;
pub mod providers;
pub mod router;
pub mod schema;
pub mod types;
pub mod usage;

// Re-export main types
pub use catalog::{ModelCapabilities, ModelCatalog};
pub use client::{
    ClientConfig, Completion, GenerationOutput, GenerationRequest, GenerationResult, LlmClient,
    ProviderClient, StructuredClient, DEFAULT_MAX_OUTPUT_TOKENS,
};
pub use factory::{client_config, create_client};
pub use providers::{GeminiClient, OpenAiClient};
pub use router::LlmRouter;
pub use schema::strictify;
pub use types::{ProviderName, ReasoningEffort, Verbosity};
pub use usage::{UsageLedger, UsageStats, UsageTotals};
