mod common;

use proptest::prelude::*;
use std::sync::Arc;

use addin_resolver::{AddinResolver, Decline, ImageHost, ModuleRequest, ResolveEvents};
use common::AddinFixture;

fn qualifiers() -> impl Strategy<Value = String> {
    (
        proptest::option::of("[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}"),
        proptest::option::of("(neutral|en-US|de-DE)"),
        proptest::option::of("(null|[0-9a-f]{16})"),
    )
        .prop_map(|(version, culture, token)| {
            let mut out = String::new();
            if let Some(v) = version {
                out.push_str(&format!(", Version={}", v));
            }
            if let Some(c) = culture {
                out.push_str(&format!(", Culture={}", c));
            }
            if let Some(t) = token {
                out.push_str(&format!(", PublicKeyToken={}", t));
            }
            out
        })
}

fn flip_case(name: &str, mask: u64) -> String {
    name.chars()
        .enumerate()
        .map(|(i, c)| {
            if mask & (1 << (i % 64)) != 0 {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn qualifiers_never_change_the_decision(quals in qualifiers(), mask in any::<u64>()) {
        let fixture = AddinFixture::new();
        fixture.module("Indexed.Module", "1.0.0.0");
        let events = Arc::new(ResolveEvents::new());
        let mut resolver = AddinResolver::with_events(
            Some(&fixture.owner()),
            Arc::new(ImageHost::new()),
            events,
        ).unwrap();

        let hit = format!("{}{}", flip_case("Indexed.Module", mask), quals);
        let module = resolver.resolve(&hit).into_module();
        prop_assert!(module.is_some());
        let module = module.unwrap();
        prop_assert_eq!(module.short_name(), "Indexed.Module");

        let miss = format!("Other.Module{}", quals);
        prop_assert_eq!(resolver.resolve(&miss).decline(), Some(Decline::NotIndexed));

        resolver.dispose().unwrap();
    }

    #[test]
    fn short_name_ignores_qualifiers(name in "[A-Za-z][A-Za-z0-9.]{0,20}", quals in qualifiers()) {
        let parsed = ModuleRequest::short_name(&format!("{}{}", name, quals)).unwrap();
        prop_assert_eq!(parsed, name);
    }
}
