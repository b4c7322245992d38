//! Sitesmith: turns a short free-text description into a complete, validated
//! single-page website through a staged, multi-model generation pipeline.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod prompts;
pub mod provider;

pub use error::ApiError;
pub use pipeline::{GenerationResult, PipelineOrchestrator, QualityMode};
