//! Generation Pipeline
//!
//! Turns a free-text site request into a validated, complete document:
//! refine -> (plan ->) synthesize -> assemble -> validate, with a bounded retry ladder
//! across the direct and structured strategies. See [`orchestrator`] for the state
//! machine; every other submodule is one stage.

pub mod assembler;
pub mod orchestrator;
pub mod planner;
pub mod refiner;
pub mod synthesizer;
pub mod types;
pub mod validator;

pub use assembler::{Assembler, DocumentShell};
pub use orchestrator::{Collaborators, PipelineOrchestrator, PipelineState, MAX_ATTEMPTS};
pub use planner::{repair_plan, PlanningFailure, StructuralPlanner};
pub use refiner::PromptRefiner;
pub use synthesizer::SectionSynthesizer;
pub use types::{
    AssembledDocument, AttemptOutcome, AttemptRecord, CallSettings, EnhancedDescription,
    GenerationRequest, GenerationResult, IssueCategory, ModeUsed, PlannedSection, QualityMode,
    SectionFragment, StructuralPlan, ValidationIssue, ValidationResult,
};
pub use validator::{PolicyRule, RuleReport, Validator};

use serde::{Deserialize, Serialize};

/// `[pipeline]` configuration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Mode used when the caller does not override it.
    #[serde(default)]
    pub default_quality_mode: QualityMode,

    /// Wall-clock budget per attempt in seconds; 0 disables the budget.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    #[serde(default = "default_refine_settings")]
    pub refine: CallSettings,

    #[serde(default = "default_plan_settings")]
    pub plan: CallSettings,

    #[serde(default = "default_section_settings")]
    pub section: CallSettings,

    #[serde(default = "default_direct_settings")]
    pub direct: CallSettings,

    /// Upper bound enforced by the document size rule.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
}

fn default_attempt_timeout_secs() -> u64 {
    180
}

fn default_refine_settings() -> CallSettings {
    CallSettings {
        max_output_tokens: 300,
        temperature: 0.7,
    }
}

fn default_plan_settings() -> CallSettings {
    CallSettings {
        max_output_tokens: 400,
        temperature: 0.2,
    }
}

fn default_section_settings() -> CallSettings {
    CallSettings {
        max_output_tokens: 2500,
        temperature: 0.6,
    }
}

fn default_direct_settings() -> CallSettings {
    CallSettings {
        max_output_tokens: 8000,
        temperature: 0.6,
    }
}

fn default_max_document_bytes() -> usize {
    512 * 1024
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_quality_mode: QualityMode::default(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            refine: default_refine_settings(),
            plan: default_plan_settings(),
            section: default_section_settings(),
            direct: default_direct_settings(),
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        for (name, settings) in [
            ("refine", &self.refine),
            ("plan", &self.plan),
            ("section", &self.section),
            ("direct", &self.direct),
        ] {
            if settings.max_output_tokens == 0 {
                errors.push(format!("{}: max_output_tokens must be greater than zero", name));
            }
            if !(0.0..=2.0).contains(&settings.temperature) {
                errors.push(format!(
                    "{}: temperature {} is outside 0.0..=2.0",
                    name, settings.temperature
                ));
            }
        }
        if self.max_document_bytes == 0 {
            errors.push("max_document_bytes must be greater than zero".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
