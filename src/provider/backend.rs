//! Collaborator seams between the pipeline and the model providers.
//!
//! The pipeline depends only on the three traits below; `ProviderBackend` implements
//! all of them on top of one configured client per effort tier.

use crate::error::ApiError;
use crate::pipeline::assembler::strip_code_fences;
use crate::provider::{
    ChatMessage, CompletionOptions, EffortTier, ModelProviderClient, ProviderFactory,
    TierProviders,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One request to a generation collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCall {
    pub instructions: String,
    pub input: String,
    pub tier: EffortTier,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// Refinement collaborator: free text in, short text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, call: GenerationCall) -> Result<String, ApiError>;
}

/// Planning collaborator: returns a parsed JSON value.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    async fn generate_structured(
        &self,
        call: GenerationCall,
    ) -> Result<serde_json::Value, ApiError>;
}

/// Markup collaborator: one fragment or one full document.
#[async_trait]
pub trait MarkupGenerator: Send + Sync {
    async fn generate_markup(&self, call: GenerationCall) -> Result<String, ApiError>;
}

/// Provider-backed implementation of every collaborator trait.
pub struct ProviderBackend {
    fast: Arc<dyn ModelProviderClient>,
    quality: Arc<dyn ModelProviderClient>,
}

impl ProviderBackend {
    pub fn new(fast: Arc<dyn ModelProviderClient>, quality: Arc<dyn ModelProviderClient>) -> Self {
        Self { fast, quality }
    }

    /// Build clients for both tiers from configuration.
    pub fn from_config(tiers: &TierProviders) -> Result<Self, ApiError> {
        let timeout = Duration::from_secs(tiers.request_timeout_secs);
        let fast = ProviderFactory::create_client(&tiers.fast.to_model_provider()?, timeout)?;
        let quality = ProviderFactory::create_client(&tiers.quality.to_model_provider()?, timeout)?;
        Ok(Self::new(Arc::from(fast), Arc::from(quality)))
    }

    fn client(&self, tier: EffortTier) -> &dyn ModelProviderClient {
        match tier {
            EffortTier::Fast => self.fast.as_ref(),
            EffortTier::Quality => self.quality.as_ref(),
        }
    }

    async fn run(&self, call: GenerationCall, json_output: bool) -> Result<String, ApiError> {
        let client = self.client(call.tier);
        let messages = vec![
            ChatMessage::system(call.instructions),
            ChatMessage::user(call.input),
        ];
        let options = CompletionOptions {
            temperature: Some(call.temperature),
            max_tokens: Some(call.max_output_tokens),
            json_output,
        };
        let response = client.complete(messages, options).await?;
        debug!(
            provider = client.provider_name(),
            model = %response.model,
            tier = %call.tier,
            completion_tokens = response.usage.completion_tokens,
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            "Completion received"
        );
        if response.content.trim().is_empty() {
            return Err(ApiError::EmptyResponse(format!(
                "{}/{}",
                client.provider_name(),
                client.model_name()
            )));
        }
        Ok(response.content)
    }
}

#[async_trait]
impl TextGenerator for ProviderBackend {
    async fn generate_text(&self, call: GenerationCall) -> Result<String, ApiError> {
        self.run(call, false).await
    }
}

#[async_trait]
impl StructuredGenerator for ProviderBackend {
    async fn generate_structured(
        &self,
        call: GenerationCall,
    ) -> Result<serde_json::Value, ApiError> {
        let content = self.run(call, true).await?;
        parse_json_object(&content)
    }
}

#[async_trait]
impl MarkupGenerator for ProviderBackend {
    async fn generate_markup(&self, call: GenerationCall) -> Result<String, ApiError> {
        self.run(call, false).await
    }
}

/// Extract the outermost JSON object from model output, tolerating code fences and
/// chatter around it.
pub fn parse_json_object(content: &str) -> Result<serde_json::Value, ApiError> {
    let body = strip_code_fences(content);
    let start = body.find('{');
    let end = body.rfind('}');
    let candidate = match (start, end) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => {
            return Err(ApiError::MalformedOutput(
                "No JSON object in structured output".to_string(),
            ))
        }
    };
    serde_json::from_str(candidate).map_err(|e| ApiError::MalformedOutput(e.to_string()))
}
