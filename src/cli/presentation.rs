//! CLI presentation: tables and JSON for command results.

use crate::catalog::RoleVariantCatalog;
use crate::error::ApiError;
use crate::pipeline::{AttemptOutcome, GenerationResult, ValidationResult};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use std::fmt::Write as _;

pub fn format_catalog_table(catalog: &RoleVariantCatalog, json: bool) -> Result<String, ApiError> {
    if json {
        let roles: Vec<serde_json::Value> = catalog
            .roles()
            .iter()
            .map(|spec| {
                serde_json::json!({
                    "role": spec.name,
                    "mandatory": spec.mandatory,
                    "variants": spec.variants,
                })
            })
            .collect();
        let value = serde_json::json!({ "version": catalog.version(), "roles": roles });
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Role", "Mandatory", "Variants"]);
    for spec in catalog.roles() {
        let variants: Vec<&str> = spec.variants.iter().map(|v| v.as_str()).collect();
        table.add_row(vec![
            spec.name.to_string(),
            if spec.mandatory { "yes" } else { "-" }.to_string(),
            variants.join(", "),
        ]);
    }
    Ok(format!("Catalog version {}\n{}", catalog.version(), table))
}

pub fn format_validation_report(result: &ValidationResult, json: bool) -> Result<String, ApiError> {
    if json {
        return Ok(serde_json::to_string_pretty(result)?);
    }
    if result.errors.is_empty() && result.warnings.is_empty() {
        return Ok("Document passed validation with no issues".to_string());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Severity", "Category", "Code", "Message"]);
    let rows = result
        .errors
        .iter()
        .map(|issue| ("error", issue))
        .chain(result.warnings.iter().map(|issue| ("warning", issue)));
    for (severity, issue) in rows {
        table.add_row(vec![
            severity.to_string(),
            issue.category.to_string(),
            issue.code.clone(),
            issue.message.clone(),
        ]);
    }
    let verdict = if result.passed { "passed" } else { "failed" };
    Ok(format!(
        "Validation {} ({} errors, {} warnings)\n{}",
        verdict,
        result.errors.len(),
        result.warnings.len(),
        table
    ))
}

/// Short report shown when the document itself went to a file.
pub fn format_generation_summary(result: &GenerationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Mode:       {}", result.mode_used);
    let _ = writeln!(out, "Digest:     {}", result.document_digest);
    let _ = writeln!(
        out,
        "Validation: {} ({} errors, {} warnings)",
        if result.validation.passed { "passed" } else { "failed" },
        result.validation.errors.len(),
        result.validation.warnings.len()
    );
    if let Some(plan) = &result.plan {
        let sections: Vec<String> = plan
            .sections()
            .iter()
            .map(|s| format!("{}:{}", s.role, s.variant))
            .collect();
        let _ = writeln!(out, "Plan:       {}", sections.join(" "));
    }
    for attempt in &result.attempts {
        let outcome = match &attempt.outcome {
            AttemptOutcome::Passed => "passed".to_string(),
            AttemptOutcome::ValidationFailed { errors } => format!("{} validation errors", errors),
            AttemptOutcome::SynthesisFailed { message } => format!("synthesis failed: {}", message),
        };
        let _ = writeln!(out, "Attempt {}:  {} -> {}", attempt.number, attempt.mode, outcome);
    }
    out.trim_end().to_string()
}
