//! Integration tests for the sitesmith generation pipeline

mod cli_commands;
mod pipeline_ladder;
mod provider_wiring;
mod test_utils;
