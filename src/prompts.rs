//! Instruction templates for every collaborator call.
//!
//! Templates are plain strings with `{placeholder}` markers. The registry is built
//! once (defaults plus configured overrides) and handed to the pipeline stages at
//! construction; nothing mutates it afterwards.

use crate::catalog::{Role, VariantId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const REFINE_INSTRUCTIONS: &str = "You turn short website requests into a concise creative brief. \
Describe the business or purpose, target audience, tone of voice, colour mood and the key \
content the page must carry. Write at most 150 words of plain prose. Do not write any HTML, \
Markdown, code or lists of section names.";

const PLAN_INSTRUCTIONS: &str = "You design the structure of a single landing page. \
Choose between {min_roles} and {max_roles} sections from the catalog below and pick exactly one \
variant for each. Sections marked mandatory must always be present. Answer with a JSON object \
mapping each section role to its variant id, in page order, and nothing else.\n\nCatalog:\n{catalog}";

const DIRECT_INSTRUCTIONS: &str = "You are a senior front-end developer. Build a complete, \
responsive single-page website from the brief using semantic HTML and Tailwind CSS utility \
classes. Include a hero section near the top and a clear call to action. Use realistic copy, \
never placeholder text. Return only the markup that belongs inside <body>, without \
<html>, <head> or Markdown code fences.";

const SECTION_DEFAULT: &str = "You are a senior front-end developer. Write the '{role}' section \
of a landing page using the '{variant}' layout, with semantic HTML and Tailwind CSS utility \
classes. Return exactly one <section> element with data-role=\"{role}\" and \
data-variant=\"{variant}\". Do not include <html>, <head>, <body>, scripts or Markdown code fences.";

const SECTION_HERO: &str = "You are a senior front-end developer. Write the hero section of a \
landing page using the '{variant}' layout with semantic HTML and Tailwind CSS utility classes: \
a strong headline, one supporting sentence and a primary button. Return exactly one <section> \
element with data-role=\"{role}\" and data-variant=\"{variant}\" and nothing else.";

const SECTION_CTA: &str = "You are a senior front-end developer. Write a closing call-to-action \
section using the '{variant}' layout with semantic HTML and Tailwind CSS utility classes. Keep \
it to a headline, one sentence and one button. Return exactly one <section> element with \
data-role=\"{role}\" and data-variant=\"{variant}\" and nothing else.";

const SECTION_FOOTER: &str = "You are a senior front-end developer. Write the page footer using \
the '{variant}' layout with semantic HTML and Tailwind CSS utility classes, including contact \
details and a copyright line. Return exactly one <footer> element wrapped in a <section> with \
data-role=\"{role}\" and data-variant=\"{variant}\" and nothing else.";

/// Configured template overrides (`[prompts]` table).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptOverrides {
    #[serde(default)]
    pub refine: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub direct: Option<String>,
    #[serde(default)]
    pub section_default: Option<String>,
    /// Role name -> section template.
    #[serde(default)]
    pub sections: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct PromptRegistry {
    refine: String,
    plan: String,
    direct: String,
    section_default: String,
    sections: HashMap<Role, String>,
}

impl Default for PromptRegistry {
    fn default() -> Self {
        let sections = [
            ("hero", SECTION_HERO),
            ("cta", SECTION_CTA),
            ("footer", SECTION_FOOTER),
        ]
        .into_iter()
        .map(|(role, template)| (Role::new(role), template.to_string()))
        .collect();

        Self {
            refine: REFINE_INSTRUCTIONS.to_string(),
            plan: PLAN_INSTRUCTIONS.to_string(),
            direct: DIRECT_INSTRUCTIONS.to_string(),
            section_default: SECTION_DEFAULT.to_string(),
            sections,
        }
    }
}

impl PromptRegistry {
    pub fn with_overrides(overrides: &PromptOverrides) -> Self {
        let mut registry = Self::default();
        if let Some(refine) = &overrides.refine {
            registry.refine = refine.clone();
        }
        if let Some(plan) = &overrides.plan {
            registry.plan = plan.clone();
        }
        if let Some(direct) = &overrides.direct {
            registry.direct = direct.clone();
        }
        if let Some(section_default) = &overrides.section_default {
            registry.section_default = section_default.clone();
        }
        for (role, template) in &overrides.sections {
            registry.sections.insert(Role::new(role.as_str()), template.clone());
        }
        registry
    }

    pub fn refine_instructions(&self) -> &str {
        &self.refine
    }

    pub fn direct_instructions(&self) -> &str {
        &self.direct
    }

    pub fn plan_instructions(&self, catalog_json: &str, min_roles: usize, max_roles: usize) -> String {
        self.plan
            .replace("{catalog}", catalog_json)
            .replace("{min_roles}", &min_roles.to_string())
            .replace("{max_roles}", &max_roles.to_string())
    }

    /// Role-specific template when one exists, otherwise the default entry.
    pub fn section_instructions(&self, role: &Role, variant: &VariantId) -> String {
        self.sections
            .get(role)
            .unwrap_or(&self.section_default)
            .replace("{role}", role.as_str())
            .replace("{variant}", variant.as_str())
    }
}
