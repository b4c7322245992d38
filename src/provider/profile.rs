//! Provider profiles: the configuration-side description of a model provider and the
//! mapping from effort tiers to profiles.

use crate::error::ApiError;
use crate::provider::{EffortTier, ModelProvider};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    #[serde(rename = "openai")]
    OpenAI,
    Anthropic,
    Ollama,
    LocalCustom,
}

impl ProviderType {
    fn default_api_key_env(self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Ollama | ProviderType::LocalCustom => None,
        }
    }
}

/// One provider profile as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub model: String,

    /// Inline key. Prefer `api_key_env` outside of local experiments.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the key; defaults per provider type.
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Base URL (OpenAI, Ollama) or full endpoint (local custom).
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if self.provider_type == ProviderType::LocalCustom
            && self.endpoint.as_deref().map_or(true, |e| e.trim().is_empty())
        {
            return Err("Local custom providers require an endpoint".to_string());
        }
        Ok(())
    }

    fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        let env_name = self
            .api_key_env
            .as_deref()
            .or_else(|| self.provider_type.default_api_key_env())?;
        std::env::var(env_name).ok().filter(|k| !k.is_empty())
    }

    fn required_api_key(&self) -> Result<String, ApiError> {
        self.resolve_api_key().ok_or_else(|| {
            ApiError::ProviderNotConfigured(format!(
                "No API key for {:?} model '{}' (set api_key or {})",
                self.provider_type,
                self.model,
                self.api_key_env
                    .as_deref()
                    .or_else(|| self.provider_type.default_api_key_env())
                    .unwrap_or("api_key_env")
            ))
        })
    }

    pub fn to_model_provider(&self) -> Result<ModelProvider, ApiError> {
        self.validate().map_err(ApiError::ProviderNotConfigured)?;
        let model = self.model.clone();
        Ok(match self.provider_type {
            ProviderType::OpenAI => ModelProvider::OpenAI {
                model,
                api_key: self.required_api_key()?,
                base_url: self.endpoint.clone(),
            },
            ProviderType::Anthropic => ModelProvider::Anthropic {
                model,
                api_key: self.required_api_key()?,
            },
            ProviderType::Ollama => ModelProvider::Ollama {
                model,
                base_url: self.endpoint.clone(),
            },
            ProviderType::LocalCustom => ModelProvider::LocalCustom {
                model,
                endpoint: self.endpoint.clone().unwrap_or_default(),
                api_key: self.resolve_api_key(),
            },
        })
    }
}

/// Effort tier -> provider profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierProviders {
    #[serde(default = "default_fast_profile")]
    pub fast: ProviderConfig,
    #[serde(default = "default_quality_profile")]
    pub quality: ProviderConfig,
    /// Per-request HTTP timeout in seconds; the only bound on a single call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_fast_profile() -> ProviderConfig {
    ProviderConfig {
        provider_type: ProviderType::OpenAI,
        model: "gpt-4o-mini".to_string(),
        api_key: None,
        api_key_env: None,
        endpoint: None,
    }
}

fn default_quality_profile() -> ProviderConfig {
    ProviderConfig {
        provider_type: ProviderType::OpenAI,
        model: "gpt-4o".to_string(),
        api_key: None,
        api_key_env: None,
        endpoint: None,
    }
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for TierProviders {
    fn default() -> Self {
        Self {
            fast: default_fast_profile(),
            quality: default_quality_profile(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl TierProviders {
    pub fn for_tier(&self, tier: EffortTier) -> &ProviderConfig {
        match tier {
            EffortTier::Fast => &self.fast,
            EffortTier::Quality => &self.quality,
        }
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        for tier in [EffortTier::Fast, EffortTier::Quality] {
            if let Err(e) = self.for_tier(tier).validate() {
                errors.push(format!("Tier '{}': {}", tier, e));
            }
        }
        if self.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be greater than zero".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
