//! Property-based tests for fallback chain composition

use proptest::prelude::*;
use reelsmith::{ProviderCategory, ProviderRecord, ProviderRegistry, QualityTier};
use std::collections::BTreeMap;

/// Distinct provider names with arbitrary scores, including ties.
fn providers() -> impl Strategy<Value = BTreeMap<String, u8>> {
    prop::collection::btree_map("[a-z]{1,6}", 0u8..=100, 1..12)
}

fn registry_of(providers: &BTreeMap<String, u8>) -> ProviderRegistry {
    let registry = ProviderRegistry::new();
    for (name, score) in providers {
        let record = ProviderRecord::new(
            name.clone(),
            ProviderCategory::Video,
            QualityTier::Standard,
            f64::from(*score),
            0.1,
        );
        registry.register(record).unwrap();
    }
    registry
}

/// Every registered provider appears once, best quality first, ties by name.
#[test]
fn test_chain_is_a_ranked_permutation() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&providers(), |providers| {
            let registry = registry_of(&providers);
            let chain = registry.fallback_chain(ProviderCategory::Video, None);

            let mut sorted = chain.clone();
            sorted.sort();
            let registered: Vec<String> = providers.keys().cloned().collect();
            prop_assert_eq!(sorted, registered);

            for pair in chain.windows(2) {
                let (a, b) = (providers[&pair[0]], providers[&pair[1]]);
                prop_assert!(a > b || (a == b && pair[0] < pair[1]));
            }
            prop_assert!(registry
                .fallback_chain(ProviderCategory::Voice, None)
                .is_empty());
            Ok(())
        })
        .unwrap();
}

/// Pinning a primary moves it to the front and keeps the rest in rank order.
#[test]
fn test_pinned_primary_leads_without_loss() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(providers(), any::<prop::sample::Index>()), |(providers, pick)| {
            let registry = registry_of(&providers);
            let ranked = registry.fallback_chain(ProviderCategory::Video, None);
            let primary = ranked[pick.index(ranked.len())].clone();

            let pinned = registry.fallback_chain(ProviderCategory::Video, Some(&primary));
            prop_assert_eq!(pinned.len(), ranked.len());
            prop_assert_eq!(&pinned[0], &primary);
            let rest: Vec<&String> = ranked.iter().filter(|name| **name != primary).collect();
            let pinned_rest: Vec<&String> = pinned[1..].iter().collect();
            prop_assert_eq!(pinned_rest, rest);

            // Unknown primaries leave the ranking untouched.
            let ignored = registry.fallback_chain(ProviderCategory::Video, Some("UNKNOWN"));
            prop_assert_eq!(ignored, ranked);
            Ok(())
        })
        .unwrap();
}

/// Availability never changes chain membership.
#[test]
fn test_availability_keeps_membership() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(providers(), prop::collection::vec(any::<bool>(), 12)),
            |(providers, flags)| {
                let registry = registry_of(&providers);
                let before = registry.fallback_chain(ProviderCategory::Video, None);
                for (name, available) in providers.keys().zip(flags) {
                    registry.set_availability(name, available).unwrap();
                }
                prop_assert_eq!(registry.fallback_chain(ProviderCategory::Video, None), before);
                Ok(())
            },
        )
        .unwrap();
}
