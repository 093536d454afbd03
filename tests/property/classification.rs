// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Zone Classification
//!
//! For any equipment, whatever its category, network attachments and
//! profiles:
//! - exactly one of master/satellite monitoring holds
//! - a master profile implies master monitoring
//! - attachment to wan networks only implies master monitoring
//! - every equipment of a topology lands in exactly one zone
//! - every zone lists its hosts and servers in ascending name order

use monsync::domain::{Equipment, Network, NetworkRole, Topology};
use monsync::ZoneClassifier;
use proptest::prelude::*;
use std::sync::Arc;

const MONSAT: &str = "monitoring::server";
const MASTER: &str = "virt::host";

fn classifier() -> ZoneClassifier {
    ZoneClassifier::new(&[MASTER], MONSAT)
}

fn arb_category() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("server"), Just("switch"), Just("pdu"), Just("router")]
}

fn arb_roles() -> impl Strategy<Value = Vec<NetworkRole>> {
    proptest::sample::subsequence(NetworkRole::ALL.to_vec(), 0..=4)
}

fn arb_profiles() -> impl Strategy<Value = Option<Vec<String>>> {
    let pool: Vec<String> = [MASTER, MONSAT, "ntp::client", "compute", "storage::nas"]
        .iter()
        .map(|p| p.to_string())
        .collect();
    proptest::option::of(proptest::sample::subsequence(pool, 0..=5))
}

fn build(name: &str, category: &str, roles: &[NetworkRole], profiles: Option<Vec<String>>) -> Equipment {
    let mut equipment = Equipment::new(name, category);
    for (i, role) in roles.iter().enumerate() {
        let network = Arc::new(Network::new(*role, role.as_str()));
        equipment
            .add_netif(network, format!("10.0.{i}.1"))
            .expect("one netif per role");
    }
    if let Some(profiles) = profiles {
        equipment.set_profiles(profiles);
    }
    equipment
}

prop_compose! {
    fn arb_equipment(name: String)(
        category in arb_category(),
        roles in arb_roles(),
        profiles in arb_profiles(),
    ) -> Equipment {
        build(&name, category, &roles, profiles)
    }
}

proptest! {
    #[test]
    fn prop_monitoring_is_exclusive(equipment in arb_equipment("gex1".into())) {
        let classifier = classifier();
        prop_assert_ne!(
            classifier.monitored_by_master(&equipment),
            classifier.monitored_by_satellite(&equipment)
        );
    }

    #[test]
    fn prop_master_profile_implies_master(
        roles in arb_roles(),
        extra in arb_profiles(),
        profile in prop_oneof![Just(MASTER), Just(MONSAT)],
    ) {
        let mut profiles = extra.unwrap_or_default();
        profiles.push(profile.to_string());
        let equipment = build("gex1", "server", &roles, Some(profiles));

        prop_assert!(classifier().monitored_by_master(&equipment));
    }

    #[test]
    fn prop_wan_only_implies_master(category in arb_category(), profiles in arb_profiles()) {
        let equipment = build("gex1", category, &[NetworkRole::Wan], profiles);
        prop_assert!(classifier().monitored_by_master(&equipment));
    }

    #[test]
    fn prop_no_netif_no_master_profile_is_satellite(category in arb_category()) {
        let equipment = build("gex1", category, &[], Some(vec!["ntp::client".to_string()]));
        prop_assert!(classifier().monitored_by_satellite(&equipment));
    }

    #[test]
    fn prop_every_equipment_in_exactly_one_zone(
        fleet in proptest::collection::vec(
            (arb_category(), arb_roles(), arb_profiles(), 0usize..3),
            0..20,
        )
    ) {
        let mut topology = Topology::default();
        let clusters = ["aa", "bb", "cc"];
        for (i, (category, roles, profiles, cluster)) in fleet.iter().enumerate() {
            let name = format!("{}x{}", clusters[*cluster], i);
            topology
                .add_cluster(clusters[*cluster])
                .insert(build(&name, category, roles, profiles.clone()));
        }

        let zones = classifier().classify(&topology);
        let mut seen: Vec<String> = zones
            .iter()
            .flat_map(|z| z.hosts.iter().map(|h| h.name.clone()))
            .collect();
        prop_assert_eq!(seen.len(), fleet.len());
        seen.sort();
        seen.dedup();
        prop_assert_eq!(seen.len(), fleet.len());

        for zone in &zones {
            let hosts = zone.host_names();
            prop_assert!(hosts.windows(2).all(|w| w[0] < w[1]));
            let servers = zone.server_names();
            prop_assert!(servers.windows(2).all(|w| w[0] < w[1]));
        }

        // master zone servers never include satellite monitors
        let master = &zones[0];
        for server in &master.servers {
            let has_monsat = server
                .attrs
                .profiles
                .as_ref()
                .is_some_and(|p| p.iter().any(|p| p == MONSAT));
            prop_assert!(!has_monsat);
        }
    }
}
