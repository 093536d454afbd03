// Copyright (c) 2025 - Cowboy AI, Inc.
//! Zone Configuration Assembler
//!
//! ```text
//! ZoneHosts ──render──> staging/<zone>/{hosts,zones}.conf
//! conf/<zone>/* ──copy──> staging/<zone>/*
//!                              │
//!                     diff against zones.d/ ──> stdout
//!                              │
//!                     deploy (unless dry-run) ──> zones.d/
//! ```
//!
//! Staging is deterministic: the same topology always produces byte-identical
//! staged files, so a second run against a deployed tree shows no change.

pub mod render;
pub mod staging;
pub mod sync;

pub use render::{HandlebarsRenderer, ZoneRenderer, HOSTS_FILE, ZONES_FILE};
pub use staging::{purge, StagingArea};
pub use sync::{deploy_tree, diff_tree, write_diffs, FileChange, FileDiff, Ownership};

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::classifier::ZoneHosts;
use crate::errors::{SyncError, SyncResult};

/// Static zone shipped with the master zone
pub const GLOBAL_TEMPLATES_ZONE: &str = "global-templates";

/// Stages, compares and deploys the zone configuration tree
pub struct ZoneAssembler<R: ZoneRenderer> {
    renderer: R,
    conf_dir: PathBuf,
    zones_dir: PathBuf,
}

impl<R: ZoneRenderer> ZoneAssembler<R> {
    /// - `conf_dir`: static per-zone configuration
    /// - `zones_dir`: deployed `zones.d` tree
    pub fn new(renderer: R, conf_dir: impl Into<PathBuf>, zones_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            conf_dir: conf_dir.into(),
            zones_dir: zones_dir.into(),
        }
    }

    pub fn zones_dir(&self) -> &Path {
        &self.zones_dir
    }

    /// Generate and copy the files of every zone into the staging area
    pub fn stage(&self, staging: &StagingArea, zones: &[ZoneHosts]) -> SyncResult<()> {
        for zone in zones {
            self.stage_zone(staging, zone)?;
            if zone.zone.is_master() {
                self.copy_static(staging, GLOBAL_TEMPLATES_ZONE)?;
            }
        }
        Ok(())
    }

    fn stage_zone(&self, staging: &StagingArea, zone: &ZoneHosts) -> SyncResult<()> {
        let dir = staging.zone_dir(zone.zone.name());
        fs::create_dir_all(&dir).map_err(|e| SyncError::io(&dir, e))?;

        let hosts_file = dir.join(HOSTS_FILE);
        info!("generating zone hosts file {}", hosts_file.display());
        let hosts = self.renderer.render_hosts(zone)?;
        fs::write(&hosts_file, hosts).map_err(|e| SyncError::io(&hosts_file, e))?;

        let zones_file = dir.join(ZONES_FILE);
        info!("generating zone zones file {}", zones_file.display());
        let zones = self.renderer.render_zones(zone)?;
        fs::write(&zones_file, zones).map_err(|e| SyncError::io(&zones_file, e))?;

        self.copy_static(staging, zone.zone.name())
    }

    fn copy_static(&self, staging: &StagingArea, zone: &str) -> SyncResult<()> {
        let src = self.conf_dir.join(zone);
        if !src.is_dir() {
            debug!("no static configuration for zone {} in {}", zone, src.display());
            return Ok(());
        }
        let copied = sync::copy_tree(&src, &staging.zone_dir(zone))?;
        debug!("copied {} static files for zone {}", copied, zone);
        Ok(())
    }

    /// Compare the staged tree with the deployed tree
    pub fn diff(&self, staging: &StagingArea) -> SyncResult<Vec<FileDiff>> {
        diff_tree(staging.path(), &self.zones_dir)
    }

    /// Copy the staged tree over the deployed tree
    pub fn deploy(&self, staging: &StagingArea, ownership: Option<Ownership>) -> SyncResult<usize> {
        deploy_tree(staging.path(), &self.zones_dir, ownership)
    }
}
