//! Markup synthesis: one call per planned role (structured mode) or one call for the
//! whole document (direct mode).
//!
//! Section calls of one attempt are polled together and joined with `try_join_all`:
//! the first failure resolves the join and drops every call still in flight, so an
//! incomplete fragment set can never reach the assembler.

use crate::catalog::{Role, VariantId};
use crate::error::ApiError;
use crate::pipeline::assembler::strip_code_fences;
use crate::pipeline::types::{CallSettings, EnhancedDescription, SectionFragment, StructuralPlan};
use crate::prompts::PromptRegistry;
use crate::provider::{EffortTier, GenerationCall, MarkupGenerator};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

pub struct SectionSynthesizer {
    generator: Arc<dyn MarkupGenerator>,
    prompts: Arc<PromptRegistry>,
    section_settings: CallSettings,
    direct_settings: CallSettings,
}

impl SectionSynthesizer {
    pub fn new(
        generator: Arc<dyn MarkupGenerator>,
        prompts: Arc<PromptRegistry>,
        section_settings: CallSettings,
        direct_settings: CallSettings,
    ) -> Self {
        Self {
            generator,
            prompts,
            section_settings,
            direct_settings,
        }
    }

    pub async fn synthesize_section(
        &self,
        role: &Role,
        variant: &VariantId,
        description: &EnhancedDescription,
    ) -> Result<SectionFragment, ApiError> {
        let call = GenerationCall {
            instructions: self.prompts.section_instructions(role, variant),
            input: description.as_str().to_string(),
            tier: EffortTier::Quality,
            max_output_tokens: self.section_settings.max_output_tokens,
            temperature: self.section_settings.temperature,
        };

        let failed = |message: String| ApiError::SynthesisFailed {
            role: role.to_string(),
            message,
        };

        let markup = self
            .generator
            .generate_markup(call)
            .await
            .map_err(|e| failed(e.to_string()))?;
        let content = strip_code_fences(&markup).trim();
        if content.is_empty() {
            return Err(failed("fragment is empty".to_string()));
        }

        debug!(role = %role, variant = %variant, chars = content.len(), "Fragment synthesized");
        Ok(SectionFragment {
            role: role.clone(),
            variant: variant.clone(),
            content: content.to_string(),
        })
    }

    /// Fan out one call per planned role; all-or-nothing.
    pub async fn synthesize_plan(
        &self,
        plan: &StructuralPlan,
        description: &EnhancedDescription,
    ) -> Result<Vec<SectionFragment>, ApiError> {
        info!(sections = plan.len(), "Synthesizing sections");
        let calls = plan
            .sections()
            .iter()
            .map(|section| self.synthesize_section(&section.role, &section.variant, description));
        try_join_all(calls).await
    }

    /// Direct mode: the whole document from a single call.
    pub async fn synthesize_document(
        &self,
        description: &EnhancedDescription,
    ) -> Result<String, ApiError> {
        let call = GenerationCall {
            instructions: self.prompts.direct_instructions().to_string(),
            input: description.as_str().to_string(),
            tier: EffortTier::Quality,
            max_output_tokens: self.direct_settings.max_output_tokens,
            temperature: self.direct_settings.temperature,
        };
        let markup = self
            .generator
            .generate_markup(call)
            .await
            .map_err(|e| ApiError::DirectSynthesisFailed(e.to_string()))?;
        if strip_code_fences(&markup).trim().is_empty() {
            return Err(ApiError::DirectSynthesisFailed(
                "document is empty".to_string(),
            ));
        }
        Ok(markup)
    }
}
