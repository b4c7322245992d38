//! Shared test utilities for integration tests
//!
//! Scripted collaborators standing in for the model providers, plus an env guard for
//! tests that touch process environment variables.

use async_trait::async_trait;
use parking_lot::Mutex;
use sitesmith::catalog::RoleVariantCatalog;
use sitesmith::error::ApiError;
use sitesmith::pipeline::{
    Assembler, Collaborators, DocumentShell, PipelineConfig, PipelineOrchestrator, Validator,
};
use sitesmith::prompts::PromptRegistry;
use sitesmith::provider::{GenerationCall, MarkupGenerator, StructuredGenerator, TextGenerator};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Refinement collaborator replaying scripted replies, then echoing a default brief.
#[derive(Default)]
pub struct ScriptedText {
    replies: Mutex<VecDeque<Result<String, ApiError>>>,
    calls: Mutex<Vec<GenerationCall>>,
}

impl ScriptedText {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let text = Self::new();
        text.replies
            .lock()
            .push_back(Err(ApiError::ProviderRequestFailed("connection reset".to_string())));
        text
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    async fn generate_text(&self, call: GenerationCall) -> Result<String, ApiError> {
        let input = call.input.clone();
        self.calls.lock().push(call);
        match self.replies.lock().pop_front() {
            Some(reply) => reply,
            None => Ok(format!("A warm, modern brief for: {}", input)),
        }
    }
}

/// Planning collaborator returning one fixed JSON value (or an error).
pub struct ScriptedPlanner {
    reply: Mutex<Option<serde_json::Value>>,
    calls: Mutex<usize>,
}

impl ScriptedPlanner {
    pub fn returning(value: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Some(value)),
            calls: Mutex::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(None),
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl StructuredGenerator for ScriptedPlanner {
    async fn generate_structured(
        &self,
        _call: GenerationCall,
    ) -> Result<serde_json::Value, ApiError> {
        *self.calls.lock() += 1;
        self.reply
            .lock()
            .clone()
            .ok_or_else(|| ApiError::MalformedOutput("not json".to_string()))
    }
}

/// Scripted reply for one direct synthesis call.
pub enum DirectReply {
    Markup(String),
    Fail,
}

/// Markup collaborator. Section calls are recognised by the `data-role` marker in the
/// instructions; everything else is a direct call.
#[derive(Default)]
pub struct ScriptedMarkup {
    failing_roles: Mutex<HashSet<String>>,
    invalid_roles: Mutex<HashSet<String>>,
    section_delay: Mutex<Option<Duration>>,
    direct_replies: Mutex<VecDeque<DirectReply>>,
    section_calls: Mutex<Vec<String>>,
    direct_calls: Mutex<usize>,
}

impl ScriptedMarkup {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_role(self: &Arc<Self>, role: &str) -> Arc<Self> {
        self.failing_roles.lock().insert(role.to_string());
        self.clone()
    }

    /// Sections for `role` pull in a script from a host outside the allowlist.
    pub fn invalid_role(self: &Arc<Self>, role: &str) -> Arc<Self> {
        self.invalid_roles.lock().insert(role.to_string());
        self.clone()
    }

    pub fn delay_sections(self: &Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.section_delay.lock() = Some(delay);
        self.clone()
    }

    pub fn push_direct(self: &Arc<Self>, reply: DirectReply) -> Arc<Self> {
        self.direct_replies.lock().push_back(reply);
        self.clone()
    }

    pub fn section_calls(&self) -> Vec<String> {
        self.section_calls.lock().clone()
    }

    pub fn direct_calls(&self) -> usize {
        *self.direct_calls.lock()
    }
}

fn marker_value(instructions: &str, attribute: &str) -> Option<String> {
    let needle = format!("{}=\"", attribute);
    let start = instructions.find(&needle)? + needle.len();
    let end = instructions[start..].find('"')? + start;
    Some(instructions[start..end].to_string())
}

#[async_trait]
impl MarkupGenerator for ScriptedMarkup {
    async fn generate_markup(&self, call: GenerationCall) -> Result<String, ApiError> {
        if let Some(role) = marker_value(&call.instructions, "data-role") {
            let variant = marker_value(&call.instructions, "data-variant").unwrap_or_default();
            self.section_calls.lock().push(role.clone());
            let delay = *self.section_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing_roles.lock().contains(&role) {
                return Err(ApiError::ProviderRequestFailed(format!("{} timed out", role)));
            }
            let script = if self.invalid_roles.lock().contains(&role) {
                "<script src=\"https://tracker.example.net/t.js\"></script>"
            } else {
                ""
            };
            return Ok(format!(
                "```html\n<section data-role=\"{role}\" data-variant=\"{variant}\">\
                 <h2>Our {role}</h2><p>Hand-made every morning in Alfama.</p>{script}</section>\n```"
            ));
        }

        *self.direct_calls.lock() += 1;
        let reply = self.direct_replies.lock().pop_front();
        match reply {
            Some(DirectReply::Fail) => Err(ApiError::ProviderRateLimit("slow down".to_string())),
            Some(DirectReply::Markup(markup)) => Ok(markup),
            None => Ok(valid_direct_document()),
        }
    }
}

/// What a well-behaved model returns for a direct call: a whole page.
pub fn valid_direct_document() -> String {
    "<!DOCTYPE html><html><head><title>x</title></head><body>\
     <section data-role=\"hero\"><h1>Fresh bread daily</h1><p>Sourdough since 1962.</p></section>\
     <section data-role=\"cta\"><a href=\"#order\">Order now</a></section>\
     </body></html>"
        .to_string()
}

/// A body that always fails the external-script rule.
pub fn invalid_direct_document() -> String {
    "<section><h1>Bakery</h1><script src=\"https://tracker.example.net/t.js\"></script></section>"
        .to_string()
}

pub fn full_plan_json() -> serde_json::Value {
    serde_json::json!({
        "hero": "hero-split",
        "features": "features-grid-3",
        "pricing": "pricing-tiers-3",
        "cta": "cta-banner",
    })
}

pub struct Harness {
    pub text: Arc<ScriptedText>,
    pub planner: Arc<ScriptedPlanner>,
    pub markup: Arc<ScriptedMarkup>,
    pub orchestrator: PipelineOrchestrator,
}

pub fn harness(
    text: Arc<ScriptedText>,
    planner: Arc<ScriptedPlanner>,
    markup: Arc<ScriptedMarkup>,
    config: &PipelineConfig,
) -> Harness {
    let shell = DocumentShell::default();
    let validator =
        Validator::with_default_rules(shell.head_scripts.clone(), config.max_document_bytes);
    let orchestrator = PipelineOrchestrator::new(
        Collaborators {
            text: text.clone(),
            structured: planner.clone(),
            markup: markup.clone(),
        },
        Arc::new(RoleVariantCatalog::builtin().unwrap()),
        Arc::new(PromptRegistry::default()),
        Assembler::new(shell),
        validator,
        config,
    );
    Harness {
        text,
        planner,
        markup,
        orchestrator,
    }
}

static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run `f` with the given environment variables set, restoring them afterwards.
/// Serialized across tests because the environment is process-global.
pub fn with_env<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
        .collect();
    for (key, value) in vars {
        std::env::set_var(key, value);
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(&key, value),
            None => std::env::remove_var(&key),
        }
    }
    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
