//! CLI parse: clap types for sitesmith. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sitesmith - generate complete single-page websites from a short description
#[derive(Parser)]
#[command(name = "sitesmith")]
#[command(about = "Generate complete single-page websites from a short description")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Generate a document from a free-text description
    Generate {
        /// What the site is about, in plain words
        prompt: String,
        /// Plan sections and synthesize them in parallel
        #[arg(long, conflicts_with = "standard")]
        high_quality: bool,
        /// Single direct synthesis call per attempt
        #[arg(long)]
        standard: bool,
        /// Write the document here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print the full generation result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the role/variant catalog
    Catalog {
        #[arg(long)]
        json: bool,
    },
    /// Validate an existing document
    Validate {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// `Some(true)` for --high-quality, `Some(false)` for --standard.
    pub fn quality_override(&self) -> Option<bool> {
        match self {
            Commands::Generate {
                high_quality,
                standard,
                ..
            } => match (high_quality, standard) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}
