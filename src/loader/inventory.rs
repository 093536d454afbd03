// Copyright (c) 2025 - Cowboy AI, Inc.
//! Phase A - Inventory Ingestion
//!
//! One directory per cluster, one YAML file per equipment category. Each
//! document maps host-set expressions to shared parameters:
//!
//! ```yaml
//! # equipments/ge/switch.yaml
//! gesw[1-4]:
//!   model: 7050SX
//! # equipments/ge/misc.yaml
//! gekvm1:
//!   category: kvm
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error, info};

use super::{cluster_dirs, read_yaml, yaml_files};
use crate::config::ClustersConfig;
use crate::domain::{Category, Cluster, Equipment, HostSet, RoleExtractor, Topology};
use crate::errors::SyncResult;

/// File whose records carry their own category
pub const MISC_FILE: &str = "misc.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
struct EquipmentParams {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

type InventoryDocument = BTreeMap<String, Option<EquipmentParams>>;

/// Create clusters and equipment from the inventory root
pub fn ingest(topology: &mut Topology, root: &Path, clusters: &ClustersConfig) -> SyncResult<()> {
    info!("parsing equipments in {}", root.display());
    let names = cluster_dirs(root)?;
    debug!("discovered clusters: {:?}", names);

    for name in names {
        if clusters.is_excluded(&name) {
            debug!("skipping cluster {} because excluded", name);
            continue;
        }
        ingest_cluster(topology, &root.join(&name), &name)?;
    }
    Ok(())
}

fn ingest_cluster(topology: &mut Topology, dir: &Path, name: &str) -> SyncResult<()> {
    debug!("parsing cluster {}", name);
    let cluster = topology.add_cluster(name);
    let extractor = RoleExtractor::new(cluster.prefix())?;

    for file in yaml_files(dir)? {
        let is_misc = file.file_name().is_some_and(|f| f == MISC_FILE);
        let result = if is_misc {
            ingest_misc_file(cluster, &extractor, &file)
        } else {
            ingest_category_file(cluster, &extractor, &file)
        };
        if let Err(err) = result {
            error!("{}", err);
        }
    }

    debug!("cluster {} has {} equipment", name, cluster.len());
    Ok(())
}

fn ingest_category_file(cluster: &mut Cluster, extractor: &RoleExtractor, path: &Path) -> SyncResult<()> {
    let category = Category::from(
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    debug!(
        "parsing equipment file {} (category: {})",
        path.display(),
        category
    );

    let document: InventoryDocument = read_yaml::<Option<_>>(path)?.unwrap_or_default();
    for (expression, params) in document {
        let params = params.unwrap_or_default();
        ingest_set(cluster, extractor, &category, &expression, params.model.as_deref());
    }
    Ok(())
}

fn ingest_misc_file(cluster: &mut Cluster, extractor: &RoleExtractor, path: &Path) -> SyncResult<()> {
    debug!("parsing misc equipment file {}", path.display());

    let document: InventoryDocument = read_yaml::<Option<_>>(path)?.unwrap_or_default();
    for (expression, params) in document {
        let params = params.unwrap_or_default();
        let Some(category) = params.category.as_deref() else {
            error!(
                "equipment set {} in {} has no category, skipping",
                expression,
                path.display()
            );
            continue;
        };
        ingest_set(
            cluster,
            extractor,
            &Category::from(category),
            &expression,
            params.model.as_deref(),
        );
    }
    Ok(())
}

fn ingest_set(
    cluster: &mut Cluster,
    extractor: &RoleExtractor,
    category: &Category,
    expression: &str,
    model: Option<&str>,
) {
    debug!("parsing equipment set {}", expression);
    let hosts = match HostSet::parse(expression) {
        Ok(hosts) => hosts,
        Err(err) => {
            error!("{}", err);
            return;
        }
    };

    for host in hosts {
        let mut equipment = Equipment::new(host, category.clone());
        if equipment.is_server() {
            if let Err(err) = equipment.extract_role(extractor) {
                // skip this server, continue with the rest of the set
                error!("{}", err);
                continue;
            }
        }
        equipment.set_model(model.map(str::to_string));

        let name = equipment.name().to_string();
        if !cluster.insert(equipment) {
            debug!(
                "equipment {} already defined in cluster {}",
                name,
                cluster.name()
            );
        }
    }
}
