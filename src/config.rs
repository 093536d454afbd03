// Copyright (c) 2025 - Cowboy AI, Inc.
//! Run Configuration
//!
//! Loaded from a TOML file. Every key has a default, so a missing file or a
//! partial file is valid:
//!
//! ```toml
//! [paths]
//! privatedata = "/root/hpc-privatedata"
//!
//! [networks]
//! exclude = ["lowlatency", "ib"]
//!
//! [conf]
//! profiles_master = ["virt::host", "storage::nas"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::{NetworkRegistry, NetworkRole};
use crate::errors::{SyncError, SyncResult};

/// Placeholder substituted with the cluster name in the certificates path
pub const CLUSTER_PLACEHOLDER: &str = "${cluster}";

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub paths: PathsConfig,
    pub networks: NetworksConfig,
    pub clusters: ClustersConfig,
    pub certs: CertsConfig,
    pub conf: ConfConfig,
}

/// Filesystem locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Monitoring system configuration root
    pub icinga2: PathBuf,
    /// Root of the private data repository
    pub privatedata: PathBuf,
    /// Certificate authority working directory
    pub ca: PathBuf,
    /// Per-cluster certificate destination, `${cluster}` is substituted
    pub crtdst: Option<String>,
    /// Hieradata root (default: `<privatedata>/hieradata`)
    pub hieradata: Option<PathBuf>,
    /// Inventory root (default: `<privatedata>/monitoring/equipments`)
    pub equipments: Option<PathBuf>,
    /// Static zone configuration (default: `<privatedata>/monitoring/conf`)
    pub conf: Option<PathBuf>,
    /// Application staging directory
    pub tmp: PathBuf,
    /// Name of the per-cluster hieradata hosts document
    pub hosts: String,
    /// Cluster encryption keys file
    pub keys: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            icinga2: PathBuf::from("/etc/icinga2"),
            privatedata: PathBuf::from("/root/hpc-privatedata"),
            ca: PathBuf::from("/var/lib/icinga2/ca"),
            crtdst: None,
            hieradata: None,
            equipments: None,
            conf: None,
            tmp: PathBuf::from("/tmp/monsync"),
            hosts: "network.yaml".to_string(),
            keys: PathBuf::from("/etc/monsync/keys.toml"),
        }
    }
}

impl PathsConfig {
    pub fn hieradata_dir(&self) -> PathBuf {
        self.hieradata
            .clone()
            .unwrap_or_else(|| self.privatedata.join("hieradata"))
    }

    pub fn equipments_dir(&self) -> PathBuf {
        self.equipments
            .clone()
            .unwrap_or_else(|| self.privatedata.join("monitoring").join("equipments"))
    }

    pub fn conf_dir(&self) -> PathBuf {
        self.conf
            .clone()
            .unwrap_or_else(|| self.privatedata.join("monitoring").join("conf"))
    }

    /// Deployed zones tree
    pub fn zones_dir(&self) -> PathBuf {
        self.icinga2.join("zones.d")
    }

    /// Certificate destination directory of one cluster
    pub fn certs_dir(&self, cluster: &str) -> PathBuf {
        match &self.crtdst {
            Some(template) => PathBuf::from(template.replace(CLUSTER_PLACEHOLDER, cluster)),
            None => self
                .privatedata
                .join("files")
                .join(cluster)
                .join("icinga2")
                .join("certs"),
        }
    }
}

/// Network names per role and networks ignored during enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworksConfig {
    pub administration: String,
    pub wan: String,
    pub management: String,
    pub bmc: String,
    pub exclude: Vec<String>,
}

impl Default for NetworksConfig {
    fn default() -> Self {
        Self {
            administration: "administration".to_string(),
            wan: "wan".to_string(),
            management: "management".to_string(),
            bmc: "bmc".to_string(),
            exclude: vec!["lowlatency".to_string()],
        }
    }
}

impl NetworksConfig {
    pub fn name_of(&self, role: NetworkRole) -> &str {
        match role {
            NetworkRole::Administration => &self.administration,
            NetworkRole::Wan => &self.wan,
            NetworkRole::Management => &self.management,
            NetworkRole::Bmc => &self.bmc,
        }
    }

    /// Build the network registry of the run
    pub fn registry(&self) -> NetworkRegistry {
        let mut registry = NetworkRegistry::new();
        for role in NetworkRole::ALL {
            registry.register(role, self.name_of(role));
        }
        registry
    }

    pub fn is_excluded(&self, network: &str) -> bool {
        self.exclude.iter().any(|excluded| excluded == network)
    }
}

/// Clusters ignored by every action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClustersConfig {
    pub exclude: Vec<String>,
}

impl Default for ClustersConfig {
    fn default() -> Self {
        Self {
            exclude: vec!["gen".to_string()],
        }
    }
}

impl ClustersConfig {
    pub fn is_excluded(&self, cluster: &str) -> bool {
        self.exclude.iter().any(|excluded| excluded == cluster)
    }
}

/// Certificates action parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertsConfig {
    /// Server roles that never get a certificate (compute nodes)
    pub nodes_roles: Vec<String>,
}

impl Default for CertsConfig {
    fn default() -> Self {
        Self {
            nodes_roles: vec!["cn".to_string(), "gn".to_string(), "bm".to_string()],
        }
    }
}

/// Zone configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfConfig {
    /// Profiles whose servers are monitored by the master zone
    pub profiles_master: Vec<String>,
    /// Profile of the servers running a satellite for their cluster
    pub profile_monsat: String,
    /// Directory holding `hosts.conf.hbs` and `zones.conf.hbs`
    pub templates: PathBuf,
    /// Owner account of the deployed configuration files, empty to keep the
    /// running account
    pub owner: String,
}

impl Default for ConfConfig {
    fn default() -> Self {
        Self {
            profiles_master: vec!["virt::host".to_string()],
            profile_monsat: "monitoring::server".to_string(),
            templates: PathBuf::from("/etc/monsync/templates"),
            owner: "nagios".to_string(),
        }
    }
}

/// `profiles` with the satellite-monitor profile appended unless present
pub fn with_monsat_profile(mut profiles: Vec<String>, monsat: &str) -> Vec<String> {
    if !profiles.iter().any(|p| p == monsat) {
        profiles.push(monsat.to_string());
    }
    profiles
}

impl ConfConfig {
    /// Configured master profiles with the satellite-monitor profile appended
    pub fn master_profiles(&self) -> Vec<String> {
        with_monsat_profile(self.profiles_master.clone(), &self.profile_monsat)
    }
}

impl RunConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist
    pub fn load(path: &Path) -> SyncResult<Self> {
        if !path.exists() {
            warn!(
                "configuration file {} does not exist, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
        Self::from_toml(&content)
            .map_err(|e| SyncError::Configuration(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Log the effective configuration at debug level
    pub fn dump(&self) {
        debug!("runtime configuration dump:");
        debug!("- icinga2: {}", self.paths.icinga2.display());
        debug!("- privatedata: {}", self.paths.privatedata.display());
        debug!("- ca: {}", self.paths.ca.display());
        debug!("- crtdst: {}", self.paths.certs_dir(CLUSTER_PLACEHOLDER).display());
        debug!("- hieradata: {}", self.paths.hieradata_dir().display());
        debug!("- equipments: {}", self.paths.equipments_dir().display());
        debug!("- conf: {}", self.paths.conf_dir().display());
        debug!("- tmp: {}", self.paths.tmp.display());
        debug!("- hosts: {}", self.paths.hosts);
        debug!("- keys: {}", self.paths.keys.display());
        debug!("- networks: {:?}", self.networks);
        debug!("- exclude_clusters: {:?}", self.clusters.exclude);
        debug!("- nodes_roles: {:?}", self.certs.nodes_roles);
        debug!("- profiles_master: {:?}", self.conf.master_profiles());
        debug!("- profile_monsat: {}", self.conf.profile_monsat);
        debug!("- templates: {}", self.conf.templates.display());
        debug!("- owner: {}", self.conf.owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(
            config.paths.hieradata_dir(),
            PathBuf::from("/root/hpc-privatedata/hieradata")
        );
        assert_eq!(
            config.paths.certs_dir("ge"),
            PathBuf::from("/root/hpc-privatedata/files/ge/icinga2/certs")
        );
        assert_eq!(config.paths.zones_dir(), PathBuf::from("/etc/icinga2/zones.d"));
    }

    #[test]
    fn test_partial_document_overrides() {
        let config = RunConfig::from_toml(
            r#"
            [paths]
            privatedata = "/srv/pd"
            crtdst = "/srv/certs/${cluster}"

            [networks]
            wan = "backbone"
            exclude = ["lowlatency", "ib"]

            [conf]
            profiles_master = ["virt::host", "storage::nas"]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.paths.equipments_dir(),
            PathBuf::from("/srv/pd/monitoring/equipments")
        );
        assert_eq!(config.paths.certs_dir("ge"), PathBuf::from("/srv/certs/ge"));
        assert!(config.networks.is_excluded("ib"));
        assert_eq!(config.networks.administration, "administration");
        assert_eq!(
            config.networks.registry().get("backbone").unwrap().role(),
            NetworkRole::Wan
        );
        assert_eq!(
            config.conf.master_profiles(),
            vec!["virt::host", "storage::nas", "monitoring::server"]
        );
        assert_eq!(config.certs.nodes_roles, vec!["cn", "gn", "bm"]);
    }

    #[test]
    fn test_unknown_types_are_rejected() {
        assert!(RunConfig::from_toml("[clusters]\nexclude = 3\n").is_err());
    }
}
