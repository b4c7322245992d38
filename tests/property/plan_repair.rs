//! Property-based tests for plan repair

use proptest::prelude::*;
use sitesmith::catalog::{Role, RoleVariantCatalog};
use sitesmith::pipeline::{repair_plan, PlanningFailure};
use std::collections::HashSet;

fn catalog() -> RoleVariantCatalog {
    RoleVariantCatalog::builtin().unwrap()
}

/// Role names drawn mostly from the catalog, with some junk and odd casing.
fn role_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(vec![
            "hero", "features", "pricing", "testimonials", "faq", "team", "gallery",
            "contact", "cta", "footer",
        ])
        .prop_map(str::to_string),
        1 => prop::sample::select(vec!["HERO", " Cta ", "Footer"]).prop_map(str::to_string),
        1 => "[a-z]{3,10}",
    ]
}

fn variant_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec![
            "hero-split", "features-grid-3", "features-grid-5", "pricing-table", "cta-banner",
            "footer-simple", "faq-accordion",
        ])
        .prop_map(str::to_string),
        "[a-z-]{1,16}",
    ]
}

proptest! {
    /// Whatever the planner says, a repaired plan only holds catalog-allowed pairs,
    /// each role once, mandatory roles present, in first-seen order.
    #[test]
    fn repaired_plans_are_always_valid(
        raw in prop::collection::vec((role_strategy(), variant_strategy()), 0..12)
    ) {
        let catalog = catalog();
        match repair_plan(&raw, &catalog) {
            Ok(plan) => {
                let mut seen = HashSet::new();
                for section in plan.sections() {
                    prop_assert!(catalog.is_allowed(&section.role, &section.variant));
                    prop_assert!(seen.insert(section.role.clone()));
                }
                for role in catalog.mandatory_roles() {
                    prop_assert!(seen.contains(role));
                }

                let mut expected_order = Vec::new();
                for (role, _) in &raw {
                    let role = Role::new(role.as_str());
                    if catalog.contains_role(&role) && !expected_order.contains(&role) {
                        expected_order.push(role);
                    }
                }
                let actual: Vec<Role> = plan.roles().cloned().collect();
                prop_assert_eq!(actual, expected_order);
            }
            Err(PlanningFailure::Empty) => {
                prop_assert!(raw
                    .iter()
                    .all(|(role, _)| !catalog.contains_role(&Role::new(role.as_str()))));
            }
            Err(PlanningFailure::MissingMandatory(missing)) => {
                prop_assert!(!missing.is_empty());
                for role in &missing {
                    prop_assert!(raw.iter().all(|(r, _)| &Role::new(r.as_str()) != role));
                }
            }
            Err(other) => prop_assert!(false, "unexpected failure {:?}", other),
        }
    }

    /// Allowed variants are never rewritten.
    #[test]
    fn allowed_variants_survive_repair(extra in prop::collection::vec(role_strategy(), 0..6)) {
        let catalog = catalog();
        let mut raw = vec![
            ("hero".to_string(), "hero-minimal".to_string()),
            ("cta".to_string(), "cta-split".to_string()),
        ];
        raw.extend(extra.into_iter().map(|role| (role, "not-a-variant".to_string())));

        let plan = repair_plan(&raw, &catalog).unwrap();
        prop_assert_eq!(
            plan.variant_for(&Role::new("hero")).map(|v| v.as_str()),
            Some("hero-minimal")
        );
        prop_assert_eq!(
            plan.variant_for(&Role::new("cta")).map(|v| v.as_str()),
            Some("cta-split")
        );
    }
}
