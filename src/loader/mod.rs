// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Loader
//!
//! Builds the [`Topology`] in two mandatory phases:
//!
//! ```text
//! equipments/<cluster>/*.yaml ──> Phase A (inventory) ──> clusters + equipment
//!                                                            │
//! hieradata/<cluster>/...     ──> Phase B (hieradata)  ──> fqdn, netifs, profiles
//! ```
//!
//! Phase B can only enrich equipment created by Phase A. Problems in one source
//! document are logged and skip that document's contribution only; a missing
//! source root is fatal.

pub mod hieradata;
pub mod inventory;

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::RunConfig;
use crate::domain::Topology;
use crate::errors::{SyncError, SyncResult};

/// Loads the fleet topology described by the configured sources
pub struct TopologyLoader<'a> {
    config: &'a RunConfig,
}

impl<'a> TopologyLoader<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// Run both phases and return the populated topology
    pub fn load(&self) -> SyncResult<Topology> {
        info!("parsing privatedata");
        let mut topology = Topology::new(self.config.networks.registry());

        inventory::ingest(
            &mut topology,
            &self.config.paths.equipments_dir(),
            &self.config.clusters,
        )?;
        hieradata::enrich(&mut topology, &self.config.paths.hieradata_dir(), self.config)?;

        Ok(topology)
    }
}

/// Read and deserialize one YAML document
pub(crate) fn read_yaml<T: DeserializeOwned>(path: &Path) -> SyncResult<T> {
    let content = fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
    serde_yaml::from_str(&content).map_err(|e| SyncError::parse(path, e))
}

/// Names of the cluster directories below `root`, sorted
pub(crate) fn cluster_dirs(root: &Path) -> SyncResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(root).map_err(|e| SyncError::io(root, e))? {
        let entry = entry.map_err(|e| SyncError::io(root, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// YAML files directly inside `dir`, sorted by file name
pub(crate) fn yaml_files(dir: &Path) -> SyncResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| SyncError::io(dir, e))? {
        let path = entry.map_err(|e| SyncError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "yaml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
