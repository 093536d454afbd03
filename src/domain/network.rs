// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects and Registry
//!
//! Networks are declared once per run from configuration: exactly one network
//! name per [`NetworkRole`]. Equipment attach to them through [`Netif`]s that
//! share the registry's handle instead of copying the network.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Network attachment error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetifError {
    #[error("equipment {equipment} already has a netif on the {role} network")]
    DuplicateRole { equipment: String, role: NetworkRole },
}

/// Functional role of a network in the fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkRole {
    /// Cluster-internal administration network
    Administration,
    /// Routed network reachable from the central monitoring master
    Wan,
    /// Out-of-band management network of switches, PDUs, etc.
    Management,
    /// Baseboard management controllers of servers
    Bmc,
}

impl NetworkRole {
    pub const ALL: [NetworkRole; 4] = [
        NetworkRole::Administration,
        NetworkRole::Wan,
        NetworkRole::Management,
        NetworkRole::Bmc,
    ];

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administration => "administration",
            Self::Wan => "wan",
            Self::Management => "management",
            Self::Bmc => "bmc",
        }
    }
}

impl fmt::Display for NetworkRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network, identified by its role and name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Network {
    role: NetworkRole,
    name: String,
}

impl Network {
    pub fn new(role: NetworkRole, name: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
        }
    }

    pub fn role(&self) -> NetworkRole {
        self.role
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Networks known for the run, keyed by network name
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    networks: BTreeMap<String, Arc<Network>>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a network. Registering a name twice replaces the earlier role.
    pub fn register(&mut self, role: NetworkRole, name: impl Into<String>) -> Arc<Network> {
        let network = Arc::new(Network::new(role, name));
        self.networks
            .insert(network.name().to_string(), Arc::clone(&network));
        network
    }

    /// Resolve a network by name
    pub fn get(&self, name: &str) -> Option<Arc<Network>> {
        self.networks.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.networks.contains_key(name)
    }

    /// Name of the network playing `role`, if any
    pub fn name_of(&self, role: NetworkRole) -> Option<&str> {
        self.networks
            .values()
            .find(|network| network.role() == role)
            .map(|network| network.name())
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

/// Network interface: one equipment attached to one network with an IP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Netif {
    network: Arc<Network>,
    ip: String,
}

impl Netif {
    pub fn new(network: Arc<Network>, ip: impl Into<String>) -> Self {
        Self {
            network,
            ip: ip.into(),
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn role(&self) -> NetworkRole {
        self.network.role()
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }
}
