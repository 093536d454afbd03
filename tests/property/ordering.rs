// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Deterministic Ordering
//!
//! Generated configuration is only diff-stable if iteration never depends on
//! insertion order.

use monsync::domain::{Cluster, Equipment, HostSet};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_cluster_iteration_strictly_ascending(
        names in proptest::collection::vec("ge[a-z]{1,4}[0-9]{0,3}", 0..40)
    ) {
        let mut cluster = Cluster::new("ge");
        for name in &names {
            cluster.insert(Equipment::new(name.clone(), "server"));
        }

        let iterated: Vec<&str> = cluster.iter().map(|e| e.name()).collect();
        prop_assert!(iterated.windows(2).all(|w| w[0] < w[1]));

        let mut expected: Vec<&str> = names.iter().map(String::as_str).collect();
        expected.sort_unstable();
        expected.dedup();
        prop_assert_eq!(iterated, expected);
    }

    #[test]
    fn prop_range_expansion_is_complete_and_unique(start in 0u32..500, len in 1u32..50) {
        let end = start + len - 1;
        let hosts = HostSet::parse(&format!("gecn[{start}-{end}]")).unwrap();

        prop_assert_eq!(hosts.len(), len as usize);
        prop_assert_eq!(hosts.names()[0].clone(), format!("gecn{start}"));
        prop_assert_eq!(hosts.names()[hosts.len() - 1].clone(), format!("gecn{end}"));
    }

    #[test]
    fn prop_expansion_is_deterministic(a in 1u32..20, b in 1u32..5) {
        let expression = format!("gesw[1-{a}]-p[1-{b}],gesw1-p1");
        let first = HostSet::parse(&expression).unwrap();
        let second = HostSet::parse(&expression).unwrap();

        // cartesian product, the trailing literal is a duplicate
        prop_assert_eq!(first.len(), (a * b) as usize);
        prop_assert_eq!(first, second);
    }
}
