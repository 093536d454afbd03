// Copyright (c) 2025 - Cowboy AI, Inc.
//! Zone Classifier
//!
//! Pure decision logic over a loaded [`Topology`]:
//!
//! ```text
//! wan_only            = ≥1 netif AND every netif on a wan network
//! has_master_profile  = profiles ∩ master_profiles ≠ ∅
//! monitored_by_master = wan_only OR has_master_profile
//! ```
//!
//! Master-monitored equipment of every cluster land in the single `master`
//! zone, the others in the satellite zone of their cluster. The management IP
//! depends on the zone, so it is resolved here into a [`HostEntry`] rather than
//! stored on the equipment.

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::config::{with_monsat_profile, ConfConfig};
use crate::domain::{Cluster, Equipment, NetworkRole, Topology};

/// A monitoring zone
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Zone {
    /// The single centralized zone
    Master,
    /// Per-cluster zone, named after the cluster
    Satellite(String),
}

impl Zone {
    pub const MASTER: &'static str = "master";

    pub fn name(&self) -> &str {
        match self {
            Self::Master => Self::MASTER,
            Self::Satellite(cluster) => cluster,
        }
    }

    pub fn is_master(&self) -> bool {
        matches!(self, Self::Master)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output attributes of a host, consumed by configuration templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostAttributes {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Vec<String>>,
}

impl HostAttributes {
    /// Servers expose their BMC IP and profiles, every equipment its category
    /// and model
    pub fn for_equipment(equipment: &Equipment) -> Self {
        let (bmc, profiles) = if equipment.is_server() {
            (
                equipment.ip_on(NetworkRole::Bmc).map(str::to_string),
                equipment.profiles().map(<[String]>::to_vec),
            )
        } else {
            (None, None)
        };

        Self {
            category: equipment.category().to_string(),
            model: equipment.model().map(str::to_string),
            bmc,
            profiles,
        }
    }
}

/// An equipment as it appears in one zone's configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostEntry {
    pub name: String,
    pub fqdn: Option<String>,
    pub category: String,
    pub ip: Option<String>,
    pub attrs: HostAttributes,
}

impl HostEntry {
    pub fn new(equipment: &Equipment, zone: &Zone) -> Self {
        Self {
            name: equipment.name().to_string(),
            fqdn: equipment.fqdn().map(str::to_string),
            category: equipment.category().to_string(),
            ip: select_ip(equipment, zone).map(str::to_string),
            attrs: HostAttributes::for_equipment(equipment),
        }
    }
}

/// Hosts of one zone and the servers anchoring its child zones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneHosts {
    pub zone: Zone,
    /// Every equipment monitored in this zone, in name order
    pub hosts: Vec<HostEntry>,
    /// Servers declared in this zone's zone tree
    pub servers: Vec<HostEntry>,
}

impl ZoneHosts {
    fn new(zone: Zone) -> Self {
        Self {
            zone,
            hosts: Vec::new(),
            servers: Vec::new(),
        }
    }

    pub fn host_names(&self) -> Vec<&str> {
        self.hosts.iter().map(|h| h.name.as_str()).collect()
    }

    pub fn server_names(&self) -> Vec<&str> {
        self.servers.iter().map(|h| h.name.as_str()).collect()
    }
}

/// True when the equipment is monitored by the master zone
pub fn monitored_by_master<S: AsRef<str>>(equipment: &Equipment, master_profiles: &[S]) -> bool {
    equipment.wan_connected_only() || equipment.has_profile(master_profiles)
}

/// True when the equipment is monitored by its cluster's satellite zone
pub fn monitored_by_satellite<S: AsRef<str>>(equipment: &Equipment, master_profiles: &[S]) -> bool {
    !monitored_by_master(equipment, master_profiles)
}

/// Management IP of the equipment in `zone`
///
/// - master: the wan IP, no fallback
/// - satellite: the administration IP, else the management IP
pub fn select_ip<'a>(equipment: &'a Equipment, zone: &Zone) -> Option<&'a str> {
    match zone {
        Zone::Master => equipment.ip_on(NetworkRole::Wan),
        Zone::Satellite(_) => equipment
            .ip_on(NetworkRole::Administration)
            .or_else(|| equipment.ip_on(NetworkRole::Management)),
    }
}

/// Classifies equipment into zones
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    master_profiles: Vec<String>,
    monsat_profile: String,
}

impl ZoneClassifier {
    /// The satellite-monitor profile is always part of the master profiles
    pub fn new<S: AsRef<str>>(profiles_master: &[S], monsat_profile: &str) -> Self {
        let profiles = profiles_master.iter().map(|p| p.as_ref().to_string()).collect();
        Self {
            master_profiles: with_monsat_profile(profiles, monsat_profile),
            monsat_profile: monsat_profile.to_string(),
        }
    }

    pub fn from_config(config: &ConfConfig) -> Self {
        Self {
            master_profiles: config.master_profiles(),
            monsat_profile: config.profile_monsat.clone(),
        }
    }

    pub fn master_profiles(&self) -> &[String] {
        &self.master_profiles
    }

    pub fn monitored_by_master(&self, equipment: &Equipment) -> bool {
        monitored_by_master(equipment, &self.master_profiles)
    }

    pub fn monitored_by_satellite(&self, equipment: &Equipment) -> bool {
        !self.monitored_by_master(equipment)
    }

    /// Master zone first, then one satellite zone per cluster in name order.
    ///
    /// Each equipment is decided once. Master zone hosts are sorted by name
    /// across clusters; a name found in several clusters keeps the equipment
    /// of the first cluster. Servers running a satellite are master hosts but
    /// not zone anchors, so a satellite zone is never declared as its own
    /// parent.
    pub fn classify(&self, topology: &Topology) -> Vec<ZoneHosts> {
        let mut master = Vec::new();
        let mut satellites = Vec::new();
        for cluster in topology.clusters() {
            satellites.push(self.split_cluster(cluster, &mut master));
        }

        let mut zones = vec![master_zone(master)];
        zones.extend(satellites);
        zones
    }

    /// Fill the satellite zone of `cluster`, pushing master-monitored equipment
    /// into `master` with their zone anchor flag
    fn split_cluster(&self, cluster: &Cluster, master: &mut Vec<(HostEntry, bool)>) -> ZoneHosts {
        debug!("classifying equipment of cluster {}", cluster.name());
        let mut zone = ZoneHosts::new(Zone::Satellite(cluster.name().to_string()));
        for equipment in cluster {
            if self.monitored_by_master(equipment) {
                debug!("equipment {} must be monitored by master", equipment.name());
                let anchor =
                    equipment.is_server() && !equipment.has_profile(&[&self.monsat_profile]);
                master.push((HostEntry::new(equipment, &Zone::Master), anchor));
                continue;
            }

            debug!("equipment {} is monitored by satellite", equipment.name());
            let entry = HostEntry::new(equipment, &zone.zone);
            if equipment.is_server() {
                zone.servers.push(entry.clone());
            }
            zone.hosts.push(entry);
        }
        zone
    }
}

fn master_zone(mut entries: Vec<(HostEntry, bool)>) -> ZoneHosts {
    // stable: equal names keep cluster order
    entries.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));

    let mut zone = ZoneHosts::new(Zone::Master);
    for (entry, anchor) in entries {
        if zone.hosts.last().is_some_and(|last| last.name == entry.name) {
            warn!(
                "equipment {} found in several clusters, keeping the first one in master zone",
                entry.name
            );
            continue;
        }
        if anchor {
            zone.servers.push(entry.clone());
        }
        zone.hosts.push(entry);
    }
    zone
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Network, NetworkRegistry};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn net(role: NetworkRole) -> Arc<Network> {
        Arc::new(Network::new(role, role.as_str()))
    }

    fn classifier() -> ZoneClassifier {
        ZoneClassifier::new(&["virt::host"], "monitoring::server")
    }

    #[test]
    fn test_monsat_profile_always_appended() {
        assert_eq!(
            classifier().master_profiles(),
            &["virt::host".to_string(), "monitoring::server".to_string()]
        );
        let dedup = ZoneClassifier::new(&["monitoring::server"], "monitoring::server");
        assert_eq!(dedup.master_profiles().len(), 1);
    }

    #[test]
    fn test_master_ip_has_no_fallback() {
        let mut equipment = Equipment::new("gesrv1", "server");
        equipment.add_netif(net(NetworkRole::Administration), "10.1.0.1").unwrap();

        assert_eq!(select_ip(&equipment, &Zone::Master), None);
        assert_eq!(
            select_ip(&equipment, &Zone::Satellite("ge".into())),
            Some("10.1.0.1")
        );
    }

    #[test]
    fn test_satellite_ip_prefers_administration() {
        let mut equipment = Equipment::new("gesrv1", "server");
        equipment.add_netif(net(NetworkRole::Management), "10.4.0.1").unwrap();
        equipment.add_netif(net(NetworkRole::Administration), "10.1.0.1").unwrap();
        let zone = Zone::Satellite("ge".into());
        assert_eq!(select_ip(&equipment, &zone), Some("10.1.0.1"));

        let mut switch = Equipment::new("gesw1", "switch");
        switch.add_netif(net(NetworkRole::Management), "10.4.0.2").unwrap();
        assert_eq!(select_ip(&switch, &zone), Some("10.4.0.2"));

        assert_eq!(select_ip(&Equipment::new("gepdu1", "pdu"), &zone), None);
    }

    #[test]
    fn test_attributes_for_server_and_other() {
        let mut server = Equipment::new("gesrv1", "server")
            .with_model("R640")
            .with_profiles(["ntp::client"]);
        server.add_netif(net(NetworkRole::Bmc), "10.2.0.1").unwrap();

        let attrs = HostAttributes::for_equipment(&server);
        assert_eq!(attrs.category, "server");
        assert_eq!(attrs.model.as_deref(), Some("R640"));
        assert_eq!(attrs.bmc.as_deref(), Some("10.2.0.1"));
        assert_eq!(attrs.profiles, Some(vec!["ntp::client".to_string()]));

        let switch = Equipment::new("gesw1", "switch");
        let attrs = HostAttributes::for_equipment(&switch);
        assert_eq!(
            serde_json::to_value(&attrs).unwrap(),
            serde_json::json!({ "category": "switch" })
        );
    }

    #[test]
    fn test_zones_split_and_monsat_not_anchor() {
        let mut registry = NetworkRegistry::new();
        let wan = registry.register(NetworkRole::Wan, "wan");
        let adm = registry.register(NetworkRole::Administration, "administration");
        let mut topology = Topology::new(registry);

        let cluster = topology.add_cluster("ge");
        let mut monsat = Equipment::new("gemon1", "server").with_profiles(["monitoring::server"]);
        monsat.add_netif(Arc::clone(&wan), "192.0.2.10").unwrap();
        monsat.add_netif(Arc::clone(&adm), "10.1.0.10").unwrap();
        cluster.insert(monsat);

        let virt = Equipment::new("gevirt1", "server").with_profiles(["virt::host"]);
        cluster.insert(virt);

        let mut gw = Equipment::new("gegw1", "router");
        gw.add_netif(Arc::clone(&wan), "192.0.2.1").unwrap();
        cluster.insert(gw);

        let mut cn = Equipment::new("gecn1", "server").with_profiles(["compute"]);
        cn.add_netif(Arc::clone(&adm), "10.1.0.21").unwrap();
        cluster.insert(cn);

        let zones = classifier().classify(&topology);
        assert_eq!(zones.len(), 2);

        let master = &zones[0];
        assert_eq!(master.zone, Zone::Master);
        assert_eq!(master.host_names(), vec!["gegw1", "gemon1", "gevirt1"]);
        assert_eq!(master.server_names(), vec!["gevirt1"]);
        assert_eq!(master.hosts[1].ip.as_deref(), Some("192.0.2.10"));

        let satellite = &zones[1];
        assert_eq!(satellite.zone, Zone::Satellite("ge".into()));
        assert_eq!(satellite.host_names(), vec!["gecn1"]);
        assert_eq!(satellite.server_names(), vec!["gecn1"]);
        assert_eq!(satellite.hosts[0].ip.as_deref(), Some("10.1.0.21"));
    }

    fn wan_only(wan: &Arc<Network>, name: &str, ip: &str) -> Equipment {
        let mut equipment = Equipment::new(name, "router");
        equipment.add_netif(Arc::clone(wan), ip).unwrap();
        equipment
    }

    #[test]
    fn test_master_hosts_sorted_across_clusters() {
        let mut registry = NetworkRegistry::new();
        let wan = registry.register(NetworkRole::Wan, "wan");
        let mut topology = Topology::new(registry);

        topology.add_cluster("ab").insert(wan_only(&wan, "zzgw1", "192.0.2.1"));
        let virt = Equipment::new("bavirt1", "server").with_profiles(["virt::host"]);
        topology.add_cluster("ba").insert(virt);
        topology.add_cluster("ba").insert(wan_only(&wan, "bagw1", "192.0.2.2"));

        let zones = classifier().classify(&topology);
        assert_eq!(zones[0].host_names(), vec!["bagw1", "bavirt1", "zzgw1"]);
        assert_eq!(zones[0].server_names(), vec!["bavirt1"]);
    }

    #[test]
    fn test_master_name_shared_by_clusters_keeps_first() {
        let mut registry = NetworkRegistry::new();
        let wan = registry.register(NetworkRole::Wan, "wan");
        let mut topology = Topology::new(registry);

        topology.add_cluster("ab").insert(wan_only(&wan, "gw1", "192.0.2.1"));
        topology.add_cluster("ba").insert(wan_only(&wan, "gw1", "192.0.2.2"));

        let zones = classifier().classify(&topology);
        assert_eq!(zones[0].host_names(), vec!["gw1"]);
        assert_eq!(zones[0].hosts[0].ip.as_deref(), Some("192.0.2.1"));
    }

    #[test]
    fn test_from_config_matches_config_profiles() {
        let config = ConfConfig::default();
        let classifier = ZoneClassifier::from_config(&config);
        assert_eq!(classifier.master_profiles(), config.master_profiles().as_slice());
    }
}
