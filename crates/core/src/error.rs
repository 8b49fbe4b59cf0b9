//! Error types for Scout.
//!
//! This module defines a unified error enum shared by every crate in the
//! workspace. The generation-facing variants form a closed taxonomy that
//! callers can match on; none of them are retried internally.

use thiserror::Error;

/// Unified error type for Scout.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic: errors are represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Provider name is not one of the supported providers
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// No API key could be resolved for the provider
    #[error("Missing API key for provider '{provider}'")]
    MissingCredentials { provider: String },

    /// Generation was requested with an empty prompt
    #[error("Prompt is required")]
    MissingPrompt,

    /// Structured generation was requested without a JSON schema
    #[error("Structured generation with '{provider}' requires a JSON schema")]
    SchemaRequired { provider: String },

    /// Provider answered with a non-success HTTP status
    #[error("{provider} API error ({status}): {body}")]
    ProviderHttp {
        provider: String,
        status: u16,
        body: String,
    },

    /// Provider answered successfully but no completion text could be found
    #[error("Empty response from provider '{provider}'")]
    EmptyResponse { provider: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failures and undecodable provider payloads
    #[error("LLM error: {0}")]
    Llm(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// HTTP status of a provider error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::ProviderHttp { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
