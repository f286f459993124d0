// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Structural Checksums

use cim_fleet_config::model::{NamespacePrefix, Profile, Subsystem};
use cim_fleet_config::{Checksum, ChecksumBuilder, DomainModel, ModelElement};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn unordered_checksum(items: &[Checksum]) -> Checksum {
    let mut builder = ChecksumBuilder::new("set");
    builder.unordered("items", items.iter().copied());
    builder.finish()
}

fn ordered_checksum(items: &[Checksum]) -> Checksum {
    let mut builder = ChecksumBuilder::new("list");
    builder.ordered("items", items.iter().copied());
    builder.finish()
}

/// Distinct element checksums, at least two
fn distinct_checksums() -> impl Strategy<Value = Vec<Checksum>> {
    prop::collection::btree_set(any::<u64>(), 2..12)
        .prop_map(|set: BTreeSet<u64>| set.into_iter().map(Checksum::new).collect())
}

proptest! {
    /// Property: unordered collections ignore order
    #[test]
    fn prop_unordered_ignores_order(items in distinct_checksums(), seed in any::<u64>()) {
        let mut shuffled = items.clone();
        let rotation = (seed as usize) % shuffled.len();
        shuffled.rotate_left(rotation);
        let last = shuffled.len() - 1;
        shuffled.swap(0, last);

        prop_assert_eq!(unordered_checksum(&items), unordered_checksum(&shuffled));
    }

    /// Property: ordered collections see a swap
    #[test]
    fn prop_ordered_sees_swap(items in distinct_checksums()) {
        let mut swapped = items.clone();
        swapped.swap(0, 1);

        prop_assert_ne!(ordered_checksum(&items), ordered_checksum(&swapped));
    }

    /// Property: subsystem insertion order does not change a profile checksum
    #[test]
    fn prop_profile_checksum_ignores_insertion_order(
        names in prop::collection::btree_set("[a-z]{1,8}", 1..8)
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let forward = names
            .iter()
            .fold(Profile::new("p"), |p, n| p.with_subsystem(Subsystem::new(n.clone(), "urn:x")));
        let backward = names
            .iter()
            .rev()
            .fold(Profile::new("p"), |p, n| p.with_subsystem(Subsystem::new(n.clone(), "urn:x")));

        prop_assert_eq!(forward.checksum(), backward.checksum());
    }

    /// Property: namespace order is part of the domain checksum
    #[test]
    fn prop_namespace_order_matters(a in "[a-z]{1,6}", b in "[a-z]{1,6}") {
        prop_assume!(a != b);
        let first = DomainModel::builder()
            .namespace(NamespacePrefix::new(a.clone(), "urn:a"))
            .namespace(NamespacePrefix::new(b.clone(), "urn:b"))
            .build()
            .unwrap();
        let second = DomainModel::builder()
            .namespace(NamespacePrefix::new(b, "urn:b"))
            .namespace(NamespacePrefix::new(a, "urn:a"))
            .build()
            .unwrap();

        prop_assert_ne!(first.checksum(), second.checksum());
    }

    /// Property: checksums are deterministic
    #[test]
    fn prop_checksum_is_deterministic(key in "[a-z.]{1,12}", value in "[ -~]{0,16}") {
        let build = || DomainModel::builder()
            .system_property(key.clone(), value.clone())
            .build()
            .unwrap();

        prop_assert_eq!(build().checksum(), build().checksum());
    }
}
