//! Configuration System
//!
//! Layered configuration for providers, pipeline tuning, the role catalog, the document
//! shell, prompt overrides and logging. Sources merge in order: built-in defaults,
//! the global user file, workspace files, then `SITESMITH__*` environment variables.

use crate::catalog::RoleVariantCatalog;
use crate::error::ApiError;
use crate::logging::{validate_logging_config, LoggingConfig};
use crate::pipeline::{DocumentShell, PipelineConfig};
use crate::prompts::PromptOverrides;
use crate::provider::TierProviders;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SitesmithConfig {
    /// Effort tier -> provider profile
    #[serde(default)]
    pub providers: TierProviders,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub shell: DocumentShell,

    #[serde(default)]
    pub prompts: PromptOverrides,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[catalog]` table: where the role whitelist comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog TOML file; the built-in catalog is used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl CatalogConfig {
    pub fn load(&self) -> Result<RoleVariantCatalog, ApiError> {
        match &self.path {
            Some(path) => RoleVariantCatalog::load_from_file(path),
            None => RoleVariantCatalog::builtin(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String),
    Pipeline(String),
    Shell(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Providers: {}", msg),
            ValidationError::Pipeline(msg) => write!(f, "Pipeline: {}", msg),
            ValidationError::Shell(msg) => write!(f, "Shell: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SitesmithConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(messages) = self.providers.validate() {
            errors.extend(messages.into_iter().map(ValidationError::Provider));
        }
        if let Err(messages) = self.pipeline.validate() {
            errors.extend(messages.into_iter().map(ValidationError::Pipeline));
        }
        if self.shell.title.trim().is_empty() {
            errors.push(ValidationError::Shell("title cannot be empty".to_string()));
        }
        if self.shell.lang.trim().is_empty() {
            errors.push(ValidationError::Shell("lang cannot be empty".to_string()));
        }
        if let Err(message) = validate_logging_config(&self.logging) {
            errors.push(ValidationError::Logging(message));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
