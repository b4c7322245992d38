//! Values flowing through one `generate()` call. Everything here lives for a single
//! request; nothing is persisted.

use crate::catalog::{Role, VariantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMode {
    #[default]
    Standard,
    HighQuality,
}

impl QualityMode {
    /// `Some(true)` forces high quality, `Some(false)` forces standard.
    pub fn resolve(default: QualityMode, override_high_quality: Option<bool>) -> QualityMode {
        match override_high_quality {
            Some(true) => QualityMode::HighQuality,
            Some(false) => QualityMode::Standard,
            None => default,
        }
    }
}

/// Immutable input of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    raw_prompt: String,
    quality_mode: QualityMode,
}

impl GenerationRequest {
    pub fn new(raw_prompt: impl Into<String>, quality_mode: QualityMode) -> Self {
        Self {
            raw_prompt: raw_prompt.into(),
            quality_mode,
        }
    }

    pub fn raw_prompt(&self) -> &str {
        &self.raw_prompt
    }

    pub fn quality_mode(&self) -> QualityMode {
        self.quality_mode
    }
}

/// Refined brief produced once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnhancedDescription(String);

impl EnhancedDescription {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnhancedDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedSection {
    pub role: Role,
    pub variant: VariantId,
}

/// Ordered Role -> Variant assignment. Only obtainable through plan repair, so every
/// value satisfies the catalog whitelist and contains the mandatory roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StructuralPlan {
    sections: Vec<PlannedSection>,
}

impl StructuralPlan {
    pub(crate) fn from_validated(sections: Vec<PlannedSection>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[PlannedSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.sections.iter().map(|section| &section.role)
    }

    pub fn variant_for(&self, role: &Role) -> Option<&VariantId> {
        self.sections
            .iter()
            .find(|section| &section.role == role)
            .map(|section| &section.variant)
    }
}

/// Markup for exactly one planned role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFragment {
    pub role: Role,
    pub variant: VariantId,
    pub content: String,
}

/// Full document text as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssembledDocument(String);

impl AssembledDocument {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Hex BLAKE3 digest of the document bytes.
    pub fn digest(&self) -> String {
        hex::encode(blake3::hash(self.0.as_bytes()).as_bytes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Structure,
    Policy,
    Accessibility,
    Content,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueCategory::Structure => write!(f, "structure"),
            IssueCategory::Policy => write!(f, "policy"),
            IssueCategory::Accessibility => write!(f, "accessibility"),
            IssueCategory::Content => write!(f, "content"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub category: IssueCategory,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(category: IssueCategory, code: &str, message: impl Into<String>) -> Self {
        Self {
            category,
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn from_issues(errors: Vec<ValidationIssue>, warnings: Vec<ValidationIssue>) -> Self {
        Self {
            passed: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Strategy that produced the returned document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeUsed {
    /// Direct synthesis: one call, no plan.
    Standard,
    /// Structured synthesis: plan, parallel sections, assembly.
    HighQuality,
}

impl fmt::Display for ModeUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeUsed::Standard => write!(f, "standard"),
            ModeUsed::HighQuality => write!(f, "high_quality"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Passed,
    ValidationFailed { errors: usize },
    SynthesisFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub number: usize,
    pub mode: ModeUsed,
    pub outcome: AttemptOutcome,
}

/// Terminal value of one `generate()` call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub document: AssembledDocument,
    pub enhanced_description: EnhancedDescription,
    pub plan: Option<StructuralPlan>,
    pub validation: ValidationResult,
    pub mode_used: ModeUsed,
    pub attempts: Vec<AttemptRecord>,
    pub document_digest: String,
    pub generated_at: DateTime<Utc>,
}

/// Token budget and temperature for one kind of collaborator call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallSettings {
    pub max_output_tokens: u32,
    pub temperature: f32,
}
