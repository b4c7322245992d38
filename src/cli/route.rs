//! CLI route: single route table and run context.

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_catalog_table, format_generation_summary, format_validation_report,
};
use crate::config::{ConfigLoader, SitesmithConfig};
use crate::error::ApiError;
use crate::pipeline::{PipelineOrchestrator, Validator};
use std::path::{Path, PathBuf};
use tracing::info;

/// What a command prints and whether the process should exit cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }
}

/// Runtime context for CLI execution: workspace and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: SitesmithConfig,
}

impl RunContext {
    /// Load and validate configuration for the workspace (or the explicit file).
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::with_config(workspace_root, config)
    }

    pub fn with_config(workspace_root: PathBuf, config: SitesmithConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &SitesmithConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::Generate { prompt, out, json, .. } => {
                self.handle_generate(prompt, command.quality_override(), out.as_deref(), *json)
            }
            Commands::Catalog { json } => {
                let catalog = self.config.catalog.load()?;
                Ok(CommandOutput::ok(format_catalog_table(&catalog, *json)?))
            }
            Commands::Validate { file, json } => self.handle_validate(file, *json),
        }
    }

    fn handle_generate(
        &self,
        prompt: &str,
        quality_override: Option<bool>,
        out: Option<&Path>,
        json: bool,
    ) -> Result<CommandOutput, ApiError> {
        let orchestrator = PipelineOrchestrator::from_config(&self.config)?;
        let result = orchestrator.generate_blocking(prompt, quality_override)?;

        if let Some(path) = out {
            let path = self.resolve(path);
            std::fs::write(&path, result.document.as_str())?;
            info!(path = %path.display(), digest = %result.document_digest, "Document written");
        }

        let text = if json {
            serde_json::to_string_pretty(&result)?
        } else if out.is_some() {
            format_generation_summary(&result)
        } else {
            result.document.as_str().to_string()
        };
        Ok(CommandOutput::ok(text))
    }

    fn handle_validate(&self, file: &Path, json: bool) -> Result<CommandOutput, ApiError> {
        let path = self.resolve(file);
        let document = std::fs::read_to_string(&path)?;
        let validator = Validator::with_default_rules(
            self.config.shell.head_scripts.clone(),
            self.config.pipeline.max_document_bytes,
        );
        let result = validator.validate(&document);
        Ok(CommandOutput {
            text: format_validation_report(&result, json)?,
            success: result.passed,
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            self.workspace_root.join(path)
        } else {
            path.to_path_buf()
        }
    }
}
