//! Property-based tests for assembly determinism

use proptest::prelude::*;
use sitesmith::catalog::RoleVariantCatalog;
use sitesmith::pipeline::{Assembler, SectionFragment};

/// One fragment per body, each for a distinct catalog role in catalog order.
fn fragments(bodies: &[String]) -> Vec<SectionFragment> {
    let catalog = RoleVariantCatalog::builtin().unwrap();
    catalog
        .roles()
        .iter()
        .zip(bodies)
        .map(|(spec, body)| SectionFragment {
            role: spec.name.clone(),
            variant: spec.variants[0].clone(),
            content: format!("<section>{}</section>", body),
        })
        .collect()
}

proptest! {
    #[test]
    fn identical_fragments_assemble_identically(
        bodies in prop::collection::vec("[A-Za-z0-9 .,!]{0,40}", 1..8)
    ) {
        let assembler = Assembler::default();
        let fragments = fragments(&bodies);
        let first = assembler.assemble_fragments(&fragments);
        let second = assembler.assemble_fragments(&fragments);
        prop_assert_eq!(first.as_str(), second.as_str());
        prop_assert_eq!(first.digest(), second.digest());
    }

    #[test]
    fn direct_assembly_is_deterministic_and_unfenced(body in "[A-Za-z0-9 <>/=\"-]{0,80}") {
        let assembler = Assembler::default();
        let raw = format!("```html\n{}\n```", body);
        let first = assembler.assemble_direct(&raw);
        let second = assembler.assemble_direct(&raw);
        prop_assert_eq!(first.as_str(), second.as_str());
        prop_assert!(first.as_str().starts_with("<!DOCTYPE html>"));
        prop_assert!(!first.as_str().contains("```"));
    }

    #[test]
    fn fragments_keep_plan_order(bodies in prop::collection::vec("[a-z]{1,12}", 2..8)) {
        let assembler = Assembler::default();
        let fragments = fragments(&bodies);
        let doc = assembler.assemble_fragments(&fragments);
        let mut last = 0;
        for fragment in &fragments {
            let marker = format!("<!-- section: {} / {} -->", fragment.role, fragment.variant);
            let position = doc.as_str().find(&marker).unwrap();
            prop_assert!(position >= last);
            last = position;
        }
    }
}
