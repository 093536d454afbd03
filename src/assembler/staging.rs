// Copyright (c) 2025 - Cowboy AI, Inc.
//! Staging Area
//!
//! Every run generates its files in an isolated directory created inside the
//! application temp directory. Nothing is written to the deployed tree before
//! the staged tree is complete.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::errors::{SyncError, SyncResult};

const RUN_PREFIX: &str = "run-";

/// Per-run staging directory
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create `parent` if needed and a fresh run directory inside it
    pub fn create(parent: &Path) -> SyncResult<Self> {
        fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
        let dir = tempfile::Builder::new()
            .prefix(RUN_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| SyncError::io(parent, e))?;
        debug!("staging run in {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory of one zone inside the run directory
    pub fn zone_dir(&self, zone: &str) -> PathBuf {
        self.dir.path().join(zone)
    }

    /// Remove the run directory
    pub fn clean(self) -> SyncResult<()> {
        let path = self.dir.path().to_path_buf();
        debug!("removing run tmp dir {}", path.display());
        self.dir.close().map_err(|e| SyncError::io(&path, e))
    }
}

/// Remove the whole application temp directory.
///
/// Returns `false` when there was nothing to remove.
pub fn purge(parent: &Path) -> SyncResult<bool> {
    if !parent.is_dir() {
        info!(
            "app tmp dir {} does not exist, nothing to remove",
            parent.display()
        );
        return Ok(false);
    }
    info!("removing app tmp dir {}", parent.display());
    fs::remove_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
    Ok(true)
}
