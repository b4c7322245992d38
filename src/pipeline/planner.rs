//! Structural planning: asks the structured-output collaborator for a Role -> Variant
//! mapping and repairs it against the catalog.
//!
//! Repair is a pure function over the catalog (`repair_plan`) so it can be exercised
//! without any provider. A planner that cannot produce a usable plan reports a
//! [`PlanningFailure`]; the orchestrator treats that as a cue to fall back to direct
//! synthesis, never as an error for the caller.

use crate::catalog::{Role, RoleVariantCatalog, VariantId};
use crate::pipeline::types::{CallSettings, EnhancedDescription, PlannedSection, StructuralPlan};
use crate::prompts::PromptRegistry;
use crate::provider::{EffortTier, GenerationCall, StructuredGenerator};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const MIN_PLAN_ROLES: usize = 4;
pub const MAX_PLAN_ROLES: usize = 6;

/// Why no plan could be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanningFailure {
    CallFailed(String),
    Unparsable(String),
    Empty,
    MissingMandatory(Vec<Role>),
}

impl fmt::Display for PlanningFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningFailure::CallFailed(msg) => write!(f, "planner call failed: {}", msg),
            PlanningFailure::Unparsable(msg) => write!(f, "planner output unparsable: {}", msg),
            PlanningFailure::Empty => write!(f, "planner returned an empty mapping"),
            PlanningFailure::MissingMandatory(roles) => {
                let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
                write!(f, "plan is missing mandatory roles: {}", names.join(", "))
            }
        }
    }
}

/// Planner output before validation: (role, variant) pairs in the order returned.
pub type RawPlan = Vec<(String, String)>;

/// Read a raw plan out of the collaborator's JSON.
///
/// Accepted shapes: `{"hero": "hero-split", ...}`, the same object under a `plan`
/// or `sections` key, or an array of `{"role": ..., "variant": ...}` objects.
pub fn raw_plan_from_json(value: &Value) -> Result<RawPlan, PlanningFailure> {
    match value {
        Value::Object(map) => {
            for key in ["plan", "sections"] {
                if let Some(inner) = map.get(key) {
                    if inner.is_object() || inner.is_array() {
                        return raw_plan_from_json(inner);
                    }
                }
            }
            Ok(map
                .iter()
                .filter_map(|(role, variant)| {
                    let variant = match variant {
                        Value::String(s) => Some(s.clone()),
                        Value::Object(obj) => obj
                            .get("variant")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        _ => None,
                    };
                    if variant.is_none() {
                        warn!(role = %role, "Ignoring planned role without a variant");
                    }
                    variant.map(|variant| (role.clone(), variant))
                })
                .collect())
        }
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(|item| {
                let role = item.get("role").and_then(Value::as_str)?;
                let variant = item.get("variant").and_then(Value::as_str)?;
                Some((role.to_string(), variant.to_string()))
            })
            .collect()),
        other => Err(PlanningFailure::Unparsable(format!(
            "expected an object or array, got {}",
            other
        ))),
    }
}

/// Validate a raw plan against the catalog, producing a new plan value.
///
/// Unknown roles and repeated roles are dropped. A known role with an unknown variant
/// gets the role's first allowed variant. Fails when nothing usable remains or a
/// mandatory role is absent.
pub fn repair_plan(
    raw: &[(String, String)],
    catalog: &RoleVariantCatalog,
) -> Result<StructuralPlan, PlanningFailure> {
    let mut seen = HashSet::new();
    let mut sections = Vec::with_capacity(raw.len());

    for (raw_role, raw_variant) in raw {
        let role = Role::new(raw_role.as_str());
        let Some(first_allowed) = catalog.first_variant(&role) else {
            warn!(role = %raw_role, "Dropping role not present in catalog");
            continue;
        };
        if !seen.insert(role.clone()) {
            warn!(role = %role, "Dropping repeated role in plan");
            continue;
        }
        let variant = VariantId::new(raw_variant.as_str());
        let variant = if catalog.is_allowed(&role, &variant) {
            variant
        } else {
            warn!(
                role = %role,
                requested = %variant,
                substituted = %first_allowed,
                "Repaired out-of-catalog variant"
            );
            first_allowed.clone()
        };
        sections.push(PlannedSection { role, variant });
    }

    if sections.is_empty() {
        return Err(PlanningFailure::Empty);
    }

    let missing: Vec<Role> = catalog
        .mandatory_roles()
        .filter(|role| !seen.contains(*role))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(PlanningFailure::MissingMandatory(missing));
    }

    Ok(StructuralPlan::from_validated(sections))
}

pub struct StructuralPlanner {
    generator: Arc<dyn StructuredGenerator>,
    catalog: Arc<RoleVariantCatalog>,
    prompts: Arc<PromptRegistry>,
    settings: CallSettings,
}

impl StructuralPlanner {
    pub fn new(
        generator: Arc<dyn StructuredGenerator>,
        catalog: Arc<RoleVariantCatalog>,
        prompts: Arc<PromptRegistry>,
        settings: CallSettings,
    ) -> Self {
        Self {
            generator,
            catalog,
            prompts,
            settings,
        }
    }

    pub async fn plan(
        &self,
        description: &EnhancedDescription,
    ) -> Result<StructuralPlan, PlanningFailure> {
        let call = GenerationCall {
            instructions: self.prompts.plan_instructions(
                &self.catalog.to_prompt_json(),
                MIN_PLAN_ROLES,
                MAX_PLAN_ROLES,
            ),
            input: description.as_str().to_string(),
            tier: EffortTier::Quality,
            max_output_tokens: self.settings.max_output_tokens,
            temperature: self.settings.temperature,
        };

        let value = self
            .generator
            .generate_structured(call)
            .await
            .map_err(|e| PlanningFailure::CallFailed(e.to_string()))?;
        debug!(raw = %value, "Planner output received");

        let raw = raw_plan_from_json(&value)?;
        let plan = repair_plan(&raw, &self.catalog)?;
        if plan.len() < MIN_PLAN_ROLES || plan.len() > MAX_PLAN_ROLES {
            debug!(
                roles = plan.len(),
                "Plan size outside the requested range; keeping it"
            );
        }
        info!(
            roles = %plan.roles().map(Role::as_str).collect::<Vec<_>>().join(","),
            "Structural plan ready"
        );
        Ok(plan)
    }
}
