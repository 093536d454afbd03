// Copyright (c) 2025 - Cowboy AI, Inc.
//! Application Actions
//!
//! - `certs`: issue and publish missing server certificates
//! - `conf`: generate, diff and deploy the zone configuration
//! - `cleanup`: remove the application temp directory
//!
//! Each run loads the whole topology from scratch.

use std::fmt;
use std::io;
use tracing::{debug, info};

use crate::assembler::{
    purge, write_diffs, FileDiff, HandlebarsRenderer, Ownership, StagingArea, ZoneAssembler,
    ZoneRenderer,
};
use crate::certs::{CertReport, CertificateSync, ClusterKeys, Icinga2Pki, PkiBackend};
use crate::classifier::ZoneClassifier;
use crate::config::RunConfig;
use crate::domain::Topology;
use crate::errors::{SyncError, SyncResult};
use crate::loader::TopologyLoader;

/// Program action
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Action {
    Certs,
    Conf,
    Cleanup,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Certs => "certs",
            Self::Conf => "conf",
            Self::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured run of the program
pub struct App {
    config: RunConfig,
    dry_run: bool,
}

impl App {
    pub fn new(config: RunConfig, dry_run: bool) -> Self {
        config.dump();
        Self { config, dry_run }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub async fn run(&self, action: Action) -> SyncResult<()> {
        debug!("running {} action", action);
        match action {
            Action::Certs => self.sync_certs().await.map(|_| ()),
            Action::Conf => self.sync_conf().map(|_| ()),
            Action::Cleanup => self.cleanup().map(|_| ()),
        }
    }

    pub fn load_topology(&self) -> SyncResult<Topology> {
        TopologyLoader::new(&self.config).load()
    }

    pub async fn sync_certs(&self) -> SyncResult<CertReport> {
        self.sync_certs_with(Icinga2Pki::default()).await
    }

    pub async fn sync_certs_with<P: PkiBackend>(&self, pki: P) -> SyncResult<CertReport> {
        let topology = self.load_topology()?;
        let keys = ClusterKeys::load(&self.config.paths.keys)?;
        CertificateSync::new(pki, &self.config, keys)
            .dry_run(self.dry_run)
            .run(&topology)
            .await
    }

    pub fn sync_conf(&self) -> SyncResult<Vec<FileDiff>> {
        let renderer = HandlebarsRenderer::from_dir(&self.config.conf.templates)?;
        self.sync_conf_with(renderer)
    }

    /// Stage every zone, print the diffs against the deployed tree, then
    /// deploy unless in dry-run
    pub fn sync_conf_with<R: ZoneRenderer>(&self, renderer: R) -> SyncResult<Vec<FileDiff>> {
        let paths = &self.config.paths;
        let staging = StagingArea::create(&paths.tmp)?;

        let topology = self.load_topology()?;
        let zones = ZoneClassifier::from_config(&self.config.conf).classify(&topology);

        let assembler = ZoneAssembler::new(renderer, paths.conf_dir(), paths.zones_dir());
        assembler.stage(&staging, &zones)?;

        let diffs = assembler.diff(&staging)?;
        write_diffs(&mut io::stdout().lock(), &diffs).map_err(|e| SyncError::io("<stdout>", e))?;

        if !self.dry_run {
            assembler.deploy(&staging, self.ownership()?)?;
        }
        staging.clean()?;

        if !self.dry_run {
            info!("check config with:");
            info!("# icinga2 daemon --validate --color");
            info!("reload icinga2 with:");
            info!("# systemctl reload icinga2.service");
        }
        Ok(diffs)
    }

    /// An empty owner keeps the ownership of the running account
    fn ownership(&self) -> SyncResult<Option<Ownership>> {
        let owner = &self.config.conf.owner;
        if owner.is_empty() {
            return Ok(None);
        }
        Ownership::of_user(owner).map(Some)
    }

    pub fn cleanup(&self) -> SyncResult<bool> {
        purge(&self.config.paths.tmp)
    }
}
