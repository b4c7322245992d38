//! Prompt refinement: raw request -> enriched brief, on the fast tier.

use crate::error::ApiError;
use crate::pipeline::assembler::strip_code_fences;
use crate::pipeline::types::{CallSettings, EnhancedDescription};
use crate::prompts::PromptRegistry;
use crate::provider::{EffortTier, GenerationCall, TextGenerator};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct PromptRefiner {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptRegistry>,
    settings: CallSettings,
}

impl PromptRefiner {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        prompts: Arc<PromptRegistry>,
        settings: CallSettings,
    ) -> Self {
        Self {
            generator,
            prompts,
            settings,
        }
    }

    /// Single call, no retry. Any failure is fatal for the request.
    pub async fn refine(&self, raw_prompt: &str) -> Result<EnhancedDescription, ApiError> {
        let raw_prompt = raw_prompt.trim();
        if raw_prompt.is_empty() {
            return Err(ApiError::RefinementFailed(
                "Request text is empty".to_string(),
            ));
        }

        let call = GenerationCall {
            instructions: self.prompts.refine_instructions().to_string(),
            input: raw_prompt.to_string(),
            tier: EffortTier::Fast,
            max_output_tokens: self.settings.max_output_tokens,
            temperature: self.settings.temperature,
        };

        let text = self.generator.generate_text(call).await.map_err(|e| {
            warn!(error = %e, "Prompt refinement call failed");
            ApiError::RefinementFailed(e.to_string())
        })?;

        let refined = strip_code_fences(&text).trim();
        if refined.is_empty() {
            return Err(ApiError::RefinementFailed(
                "Refinement produced no usable text".to_string(),
            ));
        }

        debug!(chars = refined.len(), "Prompt refined");
        Ok(EnhancedDescription::new(refined))
    }
}
