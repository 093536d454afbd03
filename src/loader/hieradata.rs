// Copyright (c) 2025 - Cowboy AI, Inc.
//! Phase B - Hieradata Enrichment
//!
//! For every cluster known from the inventory, the hosts document gives each
//! equipment its FQDN and network attachments:
//!
//! ```yaml
//! master_network:
//!   gesrv1:
//!     fqdn: gesrv1.hpc.example.org
//!     networks:
//!       administration:
//!         IP: 10.1.0.1
//!       bmc:
//!         IP: 10.2.0.1
//! ```
//!
//! and `roles/<role>.yaml` gives servers their profiles.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::{cluster_dirs, read_yaml};
use crate::config::{NetworksConfig, RunConfig};
use crate::domain::{Cluster, Equipment, NetworkRegistry, Topology};
use crate::errors::SyncResult;

/// Top-level key of the hosts document
pub const HOSTS_KEY: &str = "master_network";

/// Namespace stripped from declared profile names
pub const PROFILE_PREFIX: &str = "profiles::";

#[derive(Debug, Default, Deserialize)]
struct HostsDocument {
    #[serde(rename = "master_network", default)]
    hosts: Option<BTreeMap<String, HostParams>>,
}

#[derive(Debug, Default, Deserialize)]
struct HostParams {
    #[serde(default)]
    fqdn: Option<String>,
    #[serde(default)]
    networks: Option<BTreeMap<String, Option<NetworkParams>>>,
}

#[derive(Debug, Default, Deserialize)]
struct NetworkParams {
    #[serde(rename = "IP", default)]
    ip: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RoleDocument {
    #[serde(default)]
    profiles: Option<Vec<String>>,
}

/// Enrich the equipment of known clusters from the hieradata root
pub fn enrich(topology: &mut Topology, root: &Path, config: &RunConfig) -> SyncResult<()> {
    info!("parsing hieradata");
    let names = cluster_dirs(root)?;
    debug!("discovered clusters: {:?}", names);

    for name in names {
        if config.clusters.is_excluded(&name) {
            debug!("skipping cluster {} because excluded", name);
            continue;
        }
        let Some((cluster, networks)) = topology.cluster_with_networks_mut(&name) else {
            warn!("cluster {} not found in initialized cluster set", name);
            continue;
        };
        if let Err(err) = enrich_cluster(cluster, networks, &root.join(&name), config) {
            error!("{}", err);
        }
    }
    Ok(())
}

fn enrich_cluster(
    cluster: &mut Cluster,
    networks: &NetworkRegistry,
    dir: &Path,
    config: &RunConfig,
) -> SyncResult<()> {
    debug!("parsing hieradata for cluster {}", cluster.name());

    let path = dir.join(&config.paths.hosts);
    let document: HostsDocument = read_yaml::<Option<_>>(&path)?.unwrap_or_default();
    let hosts = document.hosts.unwrap_or_default();
    debug!("hosts: {} entries in {}", hosts.len(), path.display());

    let mut roles = RoleProfiles::new(dir.join("roles"));
    for (host, params) in hosts {
        let cluster_name = cluster.name().to_string();
        let Some(equipment) = cluster.get_mut(&host) else {
            warn!(
                "host {} not found in initialized cluster {}",
                host, cluster_name
            );
            continue;
        };

        match params.fqdn {
            Some(fqdn) => equipment.set_fqdn(fqdn),
            None => warn!("host {} has no fqdn", host),
        }
        attach_netifs(
            equipment,
            networks,
            params.networks.unwrap_or_default(),
            &config.networks,
        );
        if equipment.is_server() {
            attach_profiles(equipment, &mut roles);
        } else {
            debug!(
                "skipping profiles parsing for not server equipment {}",
                equipment.name()
            );
        }
    }
    Ok(())
}

fn attach_netifs(
    equipment: &mut Equipment,
    networks: &NetworkRegistry,
    attachments: BTreeMap<String, Option<NetworkParams>>,
    config: &NetworksConfig,
) {
    if attachments.is_empty() {
        warn!("host {} is not connected to any network", equipment.name());
        return;
    }

    for (net_name, settings) in attachments {
        if net_name == config.bmc && !equipment.is_server() {
            error!(
                "equipment {} in category {} cannot have a BMC",
                equipment.name(),
                equipment.category()
            );
            continue;
        }

        if config.is_excluded(&net_name) {
            debug!(
                "skipping {} netif on network {} because excluded",
                equipment.name(),
                net_name
            );
            continue;
        }

        let Some(network) = networks.get(&net_name) else {
            warn!(
                "network {} of host {} not found in network registry",
                net_name,
                equipment.name()
            );
            continue;
        };

        let Some(ip) = settings.and_then(|s| s.ip) else {
            warn!(
                "host {} has no IP on network {}",
                equipment.name(),
                net_name
            );
            continue;
        };

        if let Err(err) = equipment.add_netif(network, ip) {
            warn!("{}", err);
        }
    }
}

fn attach_profiles(equipment: &mut Equipment, roles: &mut RoleProfiles) {
    let Some(role) = equipment.role().map(str::to_string) else {
        warn!("server {} has no role, cannot parse its profiles", equipment.name());
        return;
    };

    match roles.get(&role) {
        Some(profiles) => equipment.set_profiles(profiles.clone()),
        None => warn!(
            "cannot parse {} profiles because role file {} is not available",
            equipment.name(),
            roles.path(&role).display()
        ),
    }
}

/// Profiles per role of one cluster, each role file read once
struct RoleProfiles {
    dir: PathBuf,
    cache: HashMap<String, Option<Vec<String>>>,
}

impl RoleProfiles {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            cache: HashMap::new(),
        }
    }

    fn path(&self, role: &str) -> PathBuf {
        self.dir.join(format!("{role}.yaml"))
    }

    fn get(&mut self, role: &str) -> Option<&Vec<String>> {
        if !self.cache.contains_key(role) {
            let loaded = self.load(role);
            self.cache.insert(role.to_string(), loaded);
        }
        self.cache.get(role).and_then(Option::as_ref)
    }

    fn load(&self, role: &str) -> Option<Vec<String>> {
        let path = self.path(role);
        if !path.exists() {
            return None;
        }

        match read_yaml::<Option<RoleDocument>>(&path) {
            Ok(document) => {
                let declared = document.unwrap_or_default().profiles.unwrap_or_default();
                Some(
                    declared
                        .into_iter()
                        .map(|profile| match profile.strip_prefix(PROFILE_PREFIX) {
                            Some(stripped) => stripped.to_string(),
                            None => profile,
                        })
                        .collect(),
                )
            }
            Err(err) => {
                error!("{}", err);
                None
            }
        }
    }
}
