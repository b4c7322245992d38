//! Pipeline orchestrator: sequences the stages and runs the retry ladder.
//!
//! ```text
//! REFINING -> PLANNING? -> (DIRECT_SYNTH | STRUCTURED_SYNTH) -> VALIDATING
//!          -> DONE | RETRY_1 | RETRY_2 | FAILED
//! ```
//!
//! Attempt 1 uses the structured path when a plan exists, attempt 2 repeats it with
//! the same plan, attempt 3 always runs direct synthesis and its result is returned
//! whatever the validation outcome. A failed fan-out or a blown attempt budget counts
//! the same as a failed validation. Retries are sequential.

use crate::catalog::RoleVariantCatalog;
use crate::config::SitesmithConfig;
use crate::error::ApiError;
use crate::pipeline::assembler::Assembler;
use crate::pipeline::planner::StructuralPlanner;
use crate::pipeline::refiner::PromptRefiner;
use crate::pipeline::synthesizer::SectionSynthesizer;
use crate::pipeline::types::{
    AssembledDocument, AttemptOutcome, AttemptRecord, EnhancedDescription, GenerationRequest,
    GenerationResult, ModeUsed, QualityMode, StructuralPlan, ValidationResult,
};
use crate::pipeline::validator::Validator;
use crate::pipeline::PipelineConfig;
use crate::prompts::PromptRegistry;
use crate::provider::{MarkupGenerator, ProviderBackend, StructuredGenerator, TextGenerator};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};

/// Original attempt plus two retries.
pub const MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Refining,
    Planning,
    DirectSynth,
    StructuredSynth,
    Validating,
    Retry1,
    Retry2,
    Done,
    Failed,
}

/// External services the pipeline calls out to.
#[derive(Clone)]
pub struct Collaborators {
    pub text: Arc<dyn TextGenerator>,
    pub structured: Arc<dyn StructuredGenerator>,
    pub markup: Arc<dyn MarkupGenerator>,
}

impl Collaborators {
    /// One provider backend serving every role.
    pub fn from_backend(backend: Arc<ProviderBackend>) -> Self {
        Self {
            text: backend.clone(),
            structured: backend.clone(),
            markup: backend,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Strategy<'a> {
    Direct,
    Structured(&'a StructuralPlan),
}

impl Strategy<'_> {
    fn mode(&self) -> ModeUsed {
        match self {
            Strategy::Direct => ModeUsed::Standard,
            Strategy::Structured(_) => ModeUsed::HighQuality,
        }
    }
}

/// Strategy for a 1-based attempt number.
fn strategy_for_attempt(
    attempt: usize,
    quality: QualityMode,
    plan: Option<&StructuralPlan>,
) -> Strategy<'_> {
    match (attempt, quality, plan) {
        (1 | 2, QualityMode::HighQuality, Some(plan)) => Strategy::Structured(plan),
        _ => Strategy::Direct,
    }
}

pub struct PipelineOrchestrator {
    refiner: PromptRefiner,
    planner: StructuralPlanner,
    synthesizer: SectionSynthesizer,
    assembler: Assembler,
    validator: Validator,
    default_quality: QualityMode,
    attempt_budget: Option<Duration>,
}

impl PipelineOrchestrator {
    pub fn new(
        collaborators: Collaborators,
        catalog: Arc<RoleVariantCatalog>,
        prompts: Arc<PromptRegistry>,
        assembler: Assembler,
        validator: Validator,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            refiner: PromptRefiner::new(collaborators.text, prompts.clone(), config.refine),
            planner: StructuralPlanner::new(
                collaborators.structured,
                catalog,
                prompts.clone(),
                config.plan,
            ),
            synthesizer: SectionSynthesizer::new(
                collaborators.markup,
                prompts,
                config.section,
                config.direct,
            ),
            assembler,
            validator,
            default_quality: config.default_quality_mode,
            attempt_budget: (config.attempt_timeout_secs > 0)
                .then(|| Duration::from_secs(config.attempt_timeout_secs)),
        }
    }

    /// Wire a provider-backed pipeline from loaded configuration.
    pub fn from_config(config: &SitesmithConfig) -> Result<Self, ApiError> {
        let backend = Arc::new(ProviderBackend::from_config(&config.providers)?);
        let catalog = Arc::new(config.catalog.load()?);
        info!(
            catalog_version = catalog.version(),
            roles = catalog.roles().len(),
            "Role catalog loaded"
        );
        let prompts = Arc::new(PromptRegistry::with_overrides(&config.prompts));
        let validator = Validator::with_default_rules(
            config.shell.head_scripts.clone(),
            config.pipeline.max_document_bytes,
        );
        Ok(Self::new(
            Collaborators::from_backend(backend),
            catalog,
            prompts,
            Assembler::new(config.shell.clone()),
            validator,
            &config.pipeline,
        ))
    }

    /// Pipeline entrypoint. `quality_override` forces high quality (`true`) or
    /// standard (`false`); `None` uses the configured default.
    pub async fn generate(
        &self,
        raw_prompt: &str,
        quality_override: Option<bool>,
    ) -> Result<GenerationResult, ApiError> {
        let request = GenerationRequest::new(
            raw_prompt,
            QualityMode::resolve(self.default_quality, quality_override),
        );
        let span = info_span!("generate", quality = ?request.quality_mode());
        self.run(&request).instrument(span).await
    }

    /// Synchronous wrapper for callers without a runtime. Must not be called from
    /// inside an async context.
    pub fn generate_blocking(
        &self,
        raw_prompt: &str,
        quality_override: Option<bool>,
    ) -> Result<GenerationResult, ApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.generate(raw_prompt, quality_override))
    }

    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationResult, ApiError> {
        let quality = request.quality_mode();

        enter(PipelineState::Refining, 0);
        let description = match self.refiner.refine(request.raw_prompt()).await {
            Ok(description) => description,
            Err(e) => {
                enter(PipelineState::Failed, 0);
                return Err(e);
            }
        };

        let plan = match quality {
            QualityMode::HighQuality => {
                enter(PipelineState::Planning, 0);
                match self.planner.plan(&description).await {
                    Ok(plan) => Some(plan),
                    Err(failure) => {
                        warn!(reason = %failure, "Planning failed; falling back to direct synthesis");
                        None
                    }
                }
            }
            QualityMode::Standard => None,
        };

        let mut attempts = Vec::with_capacity(MAX_ATTEMPTS);
        let mut latest: Option<(AssembledDocument, ValidationResult, ModeUsed)> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            match attempt {
                2 => enter(PipelineState::Retry1, attempt),
                3 => enter(PipelineState::Retry2, attempt),
                _ => {}
            }

            let strategy = strategy_for_attempt(attempt, quality, plan.as_ref());
            let mode = strategy.mode();
            enter(
                match strategy {
                    Strategy::Direct => PipelineState::DirectSynth,
                    Strategy::Structured(_) => PipelineState::StructuredSynth,
                },
                attempt,
            );

            let document = match self.synthesize(attempt, strategy, &description).await {
                Ok(document) => document,
                Err(e) => {
                    warn!(attempt, mode = %mode, error = %e, "Synthesis attempt failed");
                    attempts.push(AttemptRecord {
                        number: attempt,
                        mode,
                        outcome: AttemptOutcome::SynthesisFailed {
                            message: e.to_string(),
                        },
                    });
                    continue;
                }
            };

            enter(PipelineState::Validating, attempt);
            let validation = self.validator.validate(document.as_str());
            let passed = validation.passed;
            if passed {
                info!(attempt, mode = %mode, warnings = validation.warnings.len(), "Validation passed");
            } else {
                warn!(
                    attempt,
                    mode = %mode,
                    errors = validation.errors.len(),
                    "Validation failed"
                );
            }
            attempts.push(AttemptRecord {
                number: attempt,
                mode,
                outcome: if passed {
                    AttemptOutcome::Passed
                } else {
                    AttemptOutcome::ValidationFailed {
                        errors: validation.errors.len(),
                    }
                },
            });
            latest = Some((document, validation, mode));
            if passed {
                break;
            }
        }

        let Some((document, validation, mode_used)) = latest else {
            enter(PipelineState::Failed, attempts.len());
            return Err(ApiError::GenerationFailed(format!(
                "No attempt out of {} produced a document",
                attempts.len()
            )));
        };

        enter(PipelineState::Done, attempts.len());
        let plan = match mode_used {
            ModeUsed::HighQuality => plan,
            ModeUsed::Standard => None,
        };
        Ok(GenerationResult {
            document_digest: document.digest(),
            document,
            enhanced_description: description,
            plan,
            validation,
            mode_used,
            attempts,
            generated_at: chrono::Utc::now(),
        })
    }

    async fn synthesize(
        &self,
        attempt: usize,
        strategy: Strategy<'_>,
        description: &EnhancedDescription,
    ) -> Result<AssembledDocument, ApiError> {
        let work = async {
            match strategy {
                Strategy::Structured(plan) => {
                    let fragments = self.synthesizer.synthesize_plan(plan, description).await?;
                    Ok::<_, ApiError>(self.assembler.assemble_fragments(&fragments))
                }
                Strategy::Direct => {
                    let raw = self.synthesizer.synthesize_document(description).await?;
                    Ok::<_, ApiError>(self.assembler.assemble_direct(&raw))
                }
            }
        };

        match self.attempt_budget {
            Some(budget) => tokio::time::timeout(budget, work)
                .await
                .map_err(|_| ApiError::AttemptTimedOut {
                    attempt,
                    budget_secs: budget.as_secs(),
                })?,
            None => work.await,
        }
    }
}

fn enter(state: PipelineState, attempt: usize) {
    info!(state = ?state, attempt, "Pipeline state");
}
