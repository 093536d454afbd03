// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cluster and Topology Aggregates
//!
//! Both are keyed registries (name → owned entity) so that identity is the
//! name and iteration is always in ascending name order. Generated
//! configuration depends on this order to stay diff-stable between runs.

use std::collections::btree_map::{self, BTreeMap};

use super::{Equipment, NetworkRegistry};

/// A cluster and the equipment it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    name: String,
    equipment: BTreeMap<String, Equipment>,
}

impl Cluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            equipment: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First two characters of the cluster name, used in equipment names
    pub fn prefix(&self) -> &str {
        match self.name.char_indices().nth(2) {
            Some((end, _)) => &self.name[..end],
            None => &self.name,
        }
    }

    /// Add an equipment unless one with the same name is already known.
    ///
    /// Returns `false` when the equipment was a duplicate; the first one is kept.
    pub fn insert(&mut self, equipment: Equipment) -> bool {
        match self.equipment.entry(equipment.name().to_string()) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(equipment);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.equipment.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Equipment> {
        self.equipment.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Equipment> {
        self.equipment.get_mut(name)
    }

    /// Equipment in ascending name order
    pub fn iter(&self) -> btree_map::Values<'_, String, Equipment> {
        self.equipment.values()
    }

    pub fn len(&self) -> usize {
        self.equipment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equipment.is_empty()
    }
}

impl<'a> IntoIterator for &'a Cluster {
    type Item = &'a Equipment;
    type IntoIter = btree_map::Values<'a, String, Equipment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The whole fleet: network registry and clusters
#[derive(Debug, Clone, Default)]
pub struct Topology {
    networks: NetworkRegistry,
    clusters: BTreeMap<String, Cluster>,
}

impl Topology {
    pub fn new(networks: NetworkRegistry) -> Self {
        Self {
            networks,
            clusters: BTreeMap::new(),
        }
    }

    pub fn networks(&self) -> &NetworkRegistry {
        &self.networks
    }

    /// Get the cluster named `name`, creating it when unknown
    pub fn add_cluster(&mut self, name: &str) -> &mut Cluster {
        self.clusters
            .entry(name.to_string())
            .or_insert_with(|| Cluster::new(name))
    }

    pub fn contains_cluster(&self, name: &str) -> bool {
        self.clusters.contains_key(name)
    }

    pub fn cluster(&self, name: &str) -> Option<&Cluster> {
        self.clusters.get(name)
    }

    pub fn cluster_mut(&mut self, name: &str) -> Option<&mut Cluster> {
        self.clusters.get_mut(name)
    }

    /// Mutable cluster together with the network registry its netifs resolve against
    pub fn cluster_with_networks_mut(&mut self, name: &str) -> Option<(&mut Cluster, &NetworkRegistry)> {
        let networks = &self.networks;
        self.clusters.get_mut(name).map(|cluster| (cluster, networks))
    }

    /// Clusters in ascending name order
    pub fn clusters(&self) -> btree_map::Values<'_, String, Cluster> {
        self.clusters.values()
    }

    /// Every equipment of the fleet, cluster by cluster, in name order
    pub fn equipment(&self) -> impl Iterator<Item = (&Cluster, &Equipment)> + '_ {
        self.clusters
            .values()
            .flat_map(|cluster| cluster.iter().map(move |equipment| (cluster, equipment)))
    }
}
