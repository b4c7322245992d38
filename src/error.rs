//! Error types for the Sitesmith generation pipeline.

use thiserror::Error;

/// Errors raised by the pipeline, its collaborators and the surrounding tooling.
///
/// Only [`ApiError::RefinementFailed`] and [`ApiError::GenerationFailed`] ever escape
/// `generate()`; everything else is absorbed by the retry ladder or reported by the
/// configuration/CLI layers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("Provider returned an empty response for {0}")]
    EmptyResponse(String),

    #[error("Unparsable structured output: {0}")]
    MalformedOutput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Prompt refinement failed: {0}")]
    RefinementFailed(String),

    #[error("Section synthesis failed for role '{role}': {message}")]
    SynthesisFailed { role: String, message: String },

    #[error("Direct synthesis failed: {0}")]
    DirectSynthesisFailed(String),

    #[error("Attempt {attempt} exceeded its budget of {budget_secs}s")]
    AttemptTimedOut { attempt: usize, budget_secs: u64 },

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<toml::de::Error> for ApiError {
    fn from(err: toml::de::Error) -> Self {
        ApiError::CatalogError(err.to_string())
    }
}
