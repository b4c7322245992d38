//! CLI domain: parse, route, output, and presentation only.
//! No pipeline logic lives here; the route table calls into the orchestrator.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{format_catalog_table, format_generation_summary, format_validation_report};
pub use route::{CommandOutput, RunContext};
