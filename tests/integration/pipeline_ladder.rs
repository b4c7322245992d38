//! End-to-end runs of the orchestrator against scripted collaborators.

use crate::integration::test_utils::{
    full_plan_json, harness, invalid_direct_document, DirectReply, ScriptedMarkup,
    ScriptedPlanner, ScriptedText,
};
use sitesmith::catalog::Role;
use sitesmith::error::ApiError;
use sitesmith::pipeline::{AttemptOutcome, ModeUsed, PipelineConfig, QualityMode, MAX_ATTEMPTS};
use std::time::Duration;

fn config() -> PipelineConfig {
    PipelineConfig::default()
}

#[tokio::test]
async fn standard_request_never_plans() {
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(full_plan_json()),
        ScriptedMarkup::new(),
        &config(),
    );

    let result = h
        .orchestrator
        .generate("a sourdough bakery in Lisbon", None)
        .await
        .unwrap();

    assert_eq!(h.planner.calls(), 0);
    assert!(h.markup.section_calls().is_empty());
    assert_eq!(h.markup.direct_calls(), 1);
    assert_eq!(result.mode_used, ModeUsed::Standard);
    assert!(result.plan.is_none());
    assert!(result.validation.passed);
    assert_eq!(result.attempts.len(), 1);
    assert!(result.document.as_str().starts_with("<!DOCTYPE html>"));
    assert!(result.document.as_str().contains("Fresh bread daily"));
    assert_eq!(result.document_digest, result.document.digest());
}

#[tokio::test]
async fn explicit_standard_overrides_high_quality_default() {
    let mut config = config();
    config.default_quality_mode = QualityMode::HighQuality;
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(full_plan_json()),
        ScriptedMarkup::new(),
        &config,
    );

    let result = h.orchestrator.generate("a bakery", Some(false)).await.unwrap();
    assert_eq!(h.planner.calls(), 0);
    assert_eq!(result.mode_used, ModeUsed::Standard);
}

#[tokio::test]
async fn high_quality_request_synthesizes_sections_in_plan_order() {
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(full_plan_json()),
        ScriptedMarkup::new(),
        &config(),
    );

    let result = h.orchestrator.generate("a bakery", Some(true)).await.unwrap();

    assert_eq!(h.planner.calls(), 1);
    assert_eq!(h.markup.direct_calls(), 0);
    let mut calls = h.markup.section_calls();
    calls.sort();
    assert_eq!(calls, vec!["cta", "features", "hero", "pricing"]);

    assert_eq!(result.mode_used, ModeUsed::HighQuality);
    let plan = result.plan.as_ref().unwrap();
    let roles: Vec<&str> = plan.roles().map(|r| r.as_str()).collect();
    assert_eq!(roles, vec!["hero", "features", "pricing", "cta"]);

    let doc = result.document.as_str();
    let positions: Vec<usize> = roles
        .iter()
        .map(|role| doc.find(&format!("data-role=\"{}\"", role)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(!doc.contains("```"));
    assert!(result.validation.passed);
}

#[tokio::test]
async fn out_of_catalog_variant_is_repaired() {
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(serde_json::json!({
            "hero": "hero-split",
            "features": "features-grid-5",
            "cta": "cta-banner",
        })),
        ScriptedMarkup::new(),
        &config(),
    );

    let result = h.orchestrator.generate("a bakery", Some(true)).await.unwrap();
    let plan = result.plan.unwrap();
    assert_eq!(plan.len(), 3);
    assert_eq!(
        plan.variant_for(&Role::new("features")).map(|v| v.as_str()),
        Some("features-grid-3")
    );
    assert!(result
        .document
        .as_str()
        .contains("data-variant=\"features-grid-3\""));
}

#[tokio::test]
async fn refinement_failure_is_fatal() {
    let h = harness(
        ScriptedText::failing(),
        ScriptedPlanner::returning(full_plan_json()),
        ScriptedMarkup::new(),
        &config(),
    );

    let err = h.orchestrator.generate("a bakery", Some(true)).await.unwrap_err();
    assert!(matches!(err, ApiError::RefinementFailed(_)));
    assert_eq!(h.text.calls(), 1);
    assert_eq!(h.planner.calls(), 0);
    assert!(h.markup.section_calls().is_empty());
    assert_eq!(h.markup.direct_calls(), 0);
}

#[tokio::test]
async fn failing_section_escalates_to_direct_synthesis() {
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(full_plan_json()),
        ScriptedMarkup::new().fail_role("pricing"),
        &config(),
    );

    let result = h.orchestrator.generate("a bakery", Some(true)).await.unwrap();

    assert_eq!(result.attempts.len(), MAX_ATTEMPTS);
    for attempt in &result.attempts[..2] {
        assert_eq!(attempt.mode, ModeUsed::HighQuality);
        assert!(matches!(attempt.outcome, AttemptOutcome::SynthesisFailed { .. }));
    }
    assert_eq!(result.attempts[2].mode, ModeUsed::Standard);
    assert_eq!(result.attempts[2].outcome, AttemptOutcome::Passed);

    assert_eq!(result.mode_used, ModeUsed::Standard);
    assert!(result.plan.is_none());
    assert_eq!(h.markup.direct_calls(), 1);
    // Planned once; the second attempt reuses the same plan.
    assert_eq!(h.planner.calls(), 1);
}

#[tokio::test]
async fn invalid_sections_escalate_to_direct_synthesis() {
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(full_plan_json()),
        ScriptedMarkup::new().invalid_role("features"),
        &config(),
    );
    let result = h.orchestrator.generate("a bakery", Some(true)).await.unwrap();
    assert_eq!(result.attempts.len(), MAX_ATTEMPTS);
    assert!(matches!(
        result.attempts[0].outcome,
        AttemptOutcome::ValidationFailed { .. }
    ));
    assert!(matches!(
        result.attempts[1].outcome,
        AttemptOutcome::ValidationFailed { .. }
    ));
    assert_eq!(result.attempts[0].mode, ModeUsed::HighQuality);
    assert_eq!(result.attempts[1].mode, ModeUsed::HighQuality);
    assert_eq!(result.attempts[2].mode, ModeUsed::Standard);
    assert_eq!(h.planner.calls(), 1);
    assert_eq!(h.markup.direct_calls(), 1);
    assert_eq!(result.mode_used, ModeUsed::Standard);
    assert!(result.validation.passed);
}

#[tokio::test]
async fn empty_plan_falls_back_to_direct() {
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(serde_json::json!({})),
        ScriptedMarkup::new(),
        &config(),
    );

    let result = h.orchestrator.generate("a bakery", Some(true)).await.unwrap();
    assert_eq!(h.planner.calls(), 1);
    assert!(h.markup.section_calls().is_empty());
    assert_eq!(h.markup.direct_calls(), 1);
    assert_eq!(result.mode_used, ModeUsed::Standard);
    assert!(result.plan.is_none());
    assert_eq!(result.attempts.len(), 1);
}

#[tokio::test]
async fn plan_missing_mandatory_role_falls_back_to_direct() {
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(serde_json::json!({
            "features": "features-grid-3",
            "pricing": "pricing-table",
            "cta": "cta-banner",
            "footer": "footer-simple",
        })),
        ScriptedMarkup::new(),
        &config(),
    );

    let result = h.orchestrator.generate("a bakery", Some(true)).await.unwrap();
    assert_eq!(h.planner.calls(), 1);
    assert!(h.markup.section_calls().is_empty());
    assert_eq!(h.markup.direct_calls(), 1);
    assert_eq!(result.mode_used, ModeUsed::Standard);
    assert!(result.plan.is_none());
    assert_eq!(result.attempts.len(), 1);
}

#[tokio::test]
async fn planner_error_falls_back_to_direct() {
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::failing(),
        ScriptedMarkup::new(),
        &config(),
    );

    let result = h.orchestrator.generate("a bakery", Some(true)).await.unwrap();
    assert_eq!(result.mode_used, ModeUsed::Standard);
    assert!(result.plan.is_none());
    assert!(result.validation.passed);
}

#[tokio::test]
async fn last_document_is_returned_even_when_every_attempt_fails_validation() {
    let markup = ScriptedMarkup::new()
        .push_direct(DirectReply::Markup(invalid_direct_document()))
        .push_direct(DirectReply::Markup(invalid_direct_document()))
        .push_direct(DirectReply::Markup(invalid_direct_document()));
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(full_plan_json()),
        markup,
        &config(),
    );

    let result = h.orchestrator.generate("a bakery", None).await.unwrap();

    assert_eq!(h.markup.direct_calls(), MAX_ATTEMPTS);
    assert_eq!(result.attempts.len(), MAX_ATTEMPTS);
    assert!(!result.validation.passed);
    assert!(result
        .validation
        .errors
        .iter()
        .any(|issue| issue.code == "external_script"));
    assert!(!result.document.is_empty());
    assert!(result.document.as_str().contains("<h1>Bakery</h1>"));
}

#[tokio::test]
async fn no_document_from_any_attempt_is_an_error() {
    let markup = ScriptedMarkup::new()
        .push_direct(DirectReply::Fail)
        .push_direct(DirectReply::Fail)
        .push_direct(DirectReply::Fail);
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(full_plan_json()),
        markup,
        &config(),
    );

    let err = h.orchestrator.generate("a bakery", None).await.unwrap_err();
    assert!(matches!(err, ApiError::GenerationFailed(_)));
    assert_eq!(h.markup.direct_calls(), MAX_ATTEMPTS);
}

#[tokio::test]
async fn mixed_failures_use_every_attempt() {
    let markup = ScriptedMarkup::new()
        .push_direct(DirectReply::Fail)
        .push_direct(DirectReply::Markup(invalid_direct_document()));
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(full_plan_json()),
        markup,
        &config(),
    );

    let result = h.orchestrator.generate("a bakery", None).await.unwrap();
    assert_eq!(result.attempts.len(), 3);
    assert!(matches!(
        result.attempts[0].outcome,
        AttemptOutcome::SynthesisFailed { .. }
    ));
    assert!(matches!(
        result.attempts[1].outcome,
        AttemptOutcome::ValidationFailed { .. }
    ));
    assert_eq!(result.attempts[2].outcome, AttemptOutcome::Passed);
    assert!(result.validation.passed);
}

#[tokio::test(start_paused = true)]
async fn slow_structured_attempts_hit_the_budget() {
    let mut config = config();
    config.attempt_timeout_secs = 5;
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(full_plan_json()),
        ScriptedMarkup::new().delay_sections(Duration::from_secs(60)),
        &config,
    );

    let result = h.orchestrator.generate("a bakery", Some(true)).await.unwrap();

    for attempt in &result.attempts[..2] {
        match &attempt.outcome {
            AttemptOutcome::SynthesisFailed { message } => {
                assert!(message.contains("budget"), "unexpected message: {}", message)
            }
            other => panic!("expected a timed-out attempt, got {:?}", other),
        }
    }
    assert_eq!(result.mode_used, ModeUsed::Standard);
    assert!(result.validation.passed);
}

#[test]
fn blocking_wrapper_drives_the_pipeline() {
    let h = harness(
        ScriptedText::new(),
        ScriptedPlanner::returning(full_plan_json()),
        ScriptedMarkup::new(),
        &config(),
    );
    let result = h.orchestrator.generate_blocking("a bakery", None).unwrap();
    assert!(result.validation.passed);
    assert_eq!(result.enhanced_description.as_str(), "A warm, modern brief for: a bakery");
}
