// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for monsync
//!
//! Lays out a small two-cluster fleet in a temporary directory:
//!
//! ```text
//! privatedata/monitoring/equipments/{fr,ge,gen}/*.yaml
//! privatedata/monitoring/conf/{master,global-templates,ge}/
//! privatedata/hieradata/{fr,ge}/network.yaml, roles/*.yaml
//! icinga2/zones.d/            (empty, nothing deployed yet)
//! keys.toml                   (key of cluster ge only)
//! ```
//!
//! Cluster `gen` is excluded by the default configuration.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use monsync::{RunConfig, Topology, TopologyLoader};

pub const GE_SERVERS: &str = "\
gesrv[1-2]:
  model: R640
gecn[01-02]:
  model: C6420
gemon1:
gevirt1:
";

pub const GE_SWITCHES: &str = "\
gesw1:
  model: 7050SX
";

pub const GE_MISC: &str = "\
gegw1:
  category: router
";

pub const GE_NETWORK: &str = "\
master_network:
  gesrv1:
    fqdn: gesrv1.ge.example.org
    networks:
      administration:
        IP: 10.1.0.1
      bmc:
        IP: 10.2.0.1
      lowlatency:
        IP: 10.3.0.1
  gesrv2:
    fqdn: gesrv2.ge.example.org
    networks:
      management:
        IP: 10.4.0.2
  gecn01:
    fqdn: gecn01.ge.example.org
    networks:
      administration:
        IP: 10.1.0.11
  gecn02:
    fqdn: gecn02.ge.example.org
    networks:
      administration:
        IP: 10.1.0.12
  gemon1:
    fqdn: gemon1.ge.example.org
    networks:
      administration:
        IP: 10.1.0.10
      wan:
        IP: 192.0.2.10
  gevirt1:
    fqdn: gevirt1.ge.example.org
    networks:
      administration:
        IP: 10.1.0.20
  gesw1:
    fqdn: gesw1.ge.example.org
    networks:
      bmc:
        IP: 10.2.0.9
      management:
        IP: 10.4.0.1
  gegw1:
    fqdn: gegw1.ge.example.org
    networks:
      wan:
        IP: 192.0.2.1
";

pub const FR_NETWORK: &str = "\
master_network:
  frsrv1:
    fqdn: frsrv1.fr.example.org
    networks:
      administration:
        IP: 10.8.0.1
";

/// A fleet laid out on disk and the configuration pointing at it
pub struct Fleet {
    pub root: TempDir,
    pub config: RunConfig,
}

impl Fleet {
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn zones_dir(&self) -> PathBuf {
        self.config.paths.zones_dir()
    }

    pub fn topology(&self) -> Topology {
        TopologyLoader::new(&self.config)
            .load()
            .expect("fixture topology loads")
    }
}

pub fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().expect("fixture path has a parent"))
        .expect("create fixture dir");
    fs::write(path, content).expect("write fixture file");
}

/// Build the reference fleet
pub fn fleet() -> Fleet {
    let root = tempfile::tempdir().expect("create fleet root");
    let privatedata = root.path().join("privatedata");
    let equipments = privatedata.join("monitoring").join("equipments");
    let conf = privatedata.join("monitoring").join("conf");
    let hieradata = privatedata.join("hieradata");

    write(&equipments.join("ge/server.yaml"), GE_SERVERS);
    write(&equipments.join("ge/switch.yaml"), GE_SWITCHES);
    write(&equipments.join("ge/misc.yaml"), GE_MISC);
    write(&equipments.join("fr/server.yaml"), "frsrv1:\n");
    write(&equipments.join("gen/server.yaml"), "gensrv1:\n");

    write(&hieradata.join("ge/network.yaml"), GE_NETWORK);
    write(
        &hieradata.join("ge/roles/srv.yaml"),
        "profiles:\n  - profiles::ntp::client\n",
    );
    write(
        &hieradata.join("ge/roles/mon.yaml"),
        "profiles:\n  - profiles::monitoring::server\n  - profiles::ntp::client\n",
    );
    write(
        &hieradata.join("ge/roles/virt.yaml"),
        "profiles:\n  - profiles::virt::host\n",
    );
    write(
        &hieradata.join("ge/roles/cn.yaml"),
        "profiles:\n  - profiles::compute\n",
    );
    write(&hieradata.join("fr/network.yaml"), FR_NETWORK);
    write(&hieradata.join("gen/network.yaml"), "master_network:\n");

    write(&conf.join("master/api.conf"), "object ApiListener \"api\" {}\n");
    write(
        &conf.join("global-templates/commands.conf"),
        "object CheckCommand \"ipmi\" {}\n",
    );
    write(&conf.join("ge/services.conf"), "apply Service \"ping\" {}\n");

    write(&root.path().join("keys.toml"), "ge = \"s3cret\"\n");
    fs::create_dir_all(root.path().join("icinga2").join("zones.d")).expect("create zones.d");

    let mut config = RunConfig::default();
    config.paths.privatedata = privatedata;
    config.paths.icinga2 = root.path().join("icinga2");
    config.paths.ca = root.path().join("ca");
    config.paths.tmp = root.path().join("tmp");
    config.paths.keys = root.path().join("keys.toml");
    config.conf.templates = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
    config.conf.owner = String::new();
    fs::create_dir_all(&config.paths.ca).expect("create ca dir");

    Fleet { root, config }
}
