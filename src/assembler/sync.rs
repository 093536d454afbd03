// Copyright (c) 2025 - Cowboy AI, Inc.
//! Staged Tree Comparison and Deployment
//!
//! The staged tree mirrors the deployed `zones.d` tree: a staged file
//! `<zone>/<file>` is compared with, then copied over, `zones.d/<zone>/<file>`.

use similar::TextDiff;
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{SyncError, SyncResult};

/// Mode of the deployed configuration files
pub const DEPLOYED_MODE: u32 = 0o644;

/// Lines of context around each diff hunk
pub const DIFF_CONTEXT: usize = 3;

/// Files below `root`, relative to it, in sorted order
pub fn tree_files(root: &Path) -> SyncResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(root, Path::new(""), &mut files)?;
    Ok(files)
}

fn walk(root: &Path, relative: &Path, files: &mut Vec<PathBuf>) -> SyncResult<()> {
    let dir = root.join(relative);
    let mut entries = Vec::new();
    for entry in fs::read_dir(&dir).map_err(|e| SyncError::io(&dir, e))? {
        let entry = entry.map_err(|e| SyncError::io(&dir, e))?;
        entries.push(entry.file_name());
    }
    entries.sort();

    for name in entries {
        let path = relative.join(&name);
        if root.join(&path).is_dir() {
            walk(root, &path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Copy every file of the `src` tree into `dst`, creating directories
pub fn copy_tree(src: &Path, dst: &Path) -> SyncResult<usize> {
    let files = tree_files(src)?;
    for relative in &files {
        let from = src.join(relative);
        let to = dst.join(relative);
        debug!("copying {} into {}", from.display(), to.display());
        copy_file(&from, &to)?;
    }
    Ok(files.len())
}

fn copy_file(from: &Path, to: &Path) -> SyncResult<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
    }
    fs::copy(from, to).map_err(|e| SyncError::io(to, e))?;
    Ok(())
}

/// How a staged file differs from its deployed counterpart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// No deployed file yet
    New,
    /// Unified diff, deployed file first
    Modified(String),
    Unchanged,
}

/// Comparison result for one staged file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Path relative to the staged and deployed roots
    pub path: PathBuf,
    pub change: FileChange,
}

impl FileDiff {
    pub fn is_new(&self) -> bool {
        matches!(self.change, FileChange::New)
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self.change, FileChange::Unchanged)
    }
}

/// Compare every staged file with the deployed tree. Nothing is modified.
pub fn diff_tree(staged: &Path, deployed: &Path) -> SyncResult<Vec<FileDiff>> {
    let mut diffs = Vec::new();
    for path in tree_files(staged)? {
        let staged_file = staged.join(&path);
        let deployed_file = deployed.join(&path);

        let change = if !deployed_file.exists() {
            info!(
                "new file {} ({} does not exist)",
                path.display(),
                deployed_file.display()
            );
            FileChange::New
        } else {
            diff_file(&deployed_file, &staged_file)?
        };
        diffs.push(FileDiff { path, change });
    }
    Ok(diffs)
}

fn diff_file(deployed: &Path, staged: &Path) -> SyncResult<FileChange> {
    let old = fs::read(deployed).map_err(|e| SyncError::io(deployed, e))?;
    let new = fs::read(staged).map_err(|e| SyncError::io(staged, e))?;
    if old == new {
        return Ok(FileChange::Unchanged);
    }

    let old = String::from_utf8_lossy(&old);
    let new = String::from_utf8_lossy(&new);
    let diff = TextDiff::from_lines(&*old, &*new)
        .unified_diff()
        .context_radius(DIFF_CONTEXT)
        .header(
            &deployed.display().to_string(),
            &staged.display().to_string(),
        )
        .to_string();
    Ok(FileChange::Modified(diff))
}

/// Write the unified diffs of modified files to `out`
pub fn write_diffs<W: Write>(out: &mut W, diffs: &[FileDiff]) -> io::Result<()> {
    for diff in diffs {
        if let FileChange::Modified(text) = &diff.change {
            out.write_all(text.as_bytes())?;
        }
    }
    out.flush()
}

/// Owner and group applied to deployed files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub uid: u32,
    pub gid: u32,
}

impl Ownership {
    /// Resolve the uid and primary gid of a system account
    pub fn of_user(name: &str) -> SyncResult<Self> {
        let user = nix::unistd::User::from_name(name)
            .map_err(|e| SyncError::Configuration(format!("unable to look up user {name}: {e}")))?
            .ok_or_else(|| SyncError::Lookup(format!("user {name} not found")))?;
        Ok(Self {
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
        })
    }
}

/// Copy the staged tree over the deployed tree with mode `0644`, and the given
/// ownership when set
pub fn deploy_tree(staged: &Path, deployed: &Path, ownership: Option<Ownership>) -> SyncResult<usize> {
    let files = tree_files(staged)?;
    for relative in &files {
        let from = staged.join(relative);
        let to = deployed.join(relative);
        info!("copying file {} to {}", from.display(), to.display());
        copy_file(&from, &to)?;

        if let Some(owner) = ownership {
            std::os::unix::fs::chown(&to, Some(owner.uid), Some(owner.gid))
                .map_err(|e| SyncError::io(&to, e))?;
        }
        fs::set_permissions(&to, fs::Permissions::from_mode(DEPLOYED_MODE))
            .map_err(|e| SyncError::io(&to, e))?;
    }
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_tree_files_sorted_and_recursive() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "master/zones.conf", "");
        write(root.path(), "ge/hosts.conf", "");
        write(root.path(), "master/hosts.conf", "");
        write(root.path(), "ge/services/ping.conf", "");

        assert_eq!(
            tree_files(root.path()).unwrap(),
            vec![
                PathBuf::from("ge/hosts.conf"),
                PathBuf::from("ge/services/ping.conf"),
                PathBuf::from("master/hosts.conf"),
                PathBuf::from("master/zones.conf"),
            ]
        );
    }

    #[test]
    fn test_diff_new_modified_unchanged() {
        let staged = tempfile::tempdir().unwrap();
        let deployed = tempfile::tempdir().unwrap();
        write(staged.path(), "ge/hosts.conf", "a\nb\nc\n");
        write(staged.path(), "ge/zones.conf", "same\n");
        write(staged.path(), "master/hosts.conf", "new\n");
        write(deployed.path(), "ge/hosts.conf", "a\nx\nc\n");
        write(deployed.path(), "ge/zones.conf", "same\n");

        let diffs = diff_tree(staged.path(), deployed.path()).unwrap();
        assert_eq!(diffs.len(), 3);

        let FileChange::Modified(text) = &diffs[0].change else {
            panic!("expected a modified file, got {:?}", diffs[0]);
        };
        let deployed_header = format!("--- {}", deployed.path().join("ge/hosts.conf").display());
        assert!(text.starts_with(&deployed_header));
        assert!(text.contains("-x\n"));
        assert!(text.contains("+b\n"));

        assert!(diffs[1].is_unchanged());
        assert!(diffs[2].is_new());

        let mut out = Vec::new();
        write_diffs(&mut out, &diffs).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), *text);
    }

    #[test]
    fn test_deploy_creates_dirs_and_sets_mode() {
        let staged = tempfile::tempdir().unwrap();
        let deployed = tempfile::tempdir().unwrap();
        write(staged.path(), "ge/hosts.conf", "object Host \"gecn1\" {}\n");

        let copied = deploy_tree(staged.path(), deployed.path(), None).unwrap();
        assert_eq!(copied, 1);

        let target = deployed.path().join("ge/hosts.conf");
        assert_eq!(fs::read_to_string(&target).unwrap(), "object Host \"gecn1\" {}\n");
        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, DEPLOYED_MODE);

        let diffs = diff_tree(staged.path(), deployed.path()).unwrap();
        assert!(diffs.iter().all(FileDiff::is_unchanged));
    }

    #[test]
    fn test_unknown_owner_is_a_lookup_error() {
        assert!(matches!(
            Ownership::of_user("monsync-no-such-user"),
            Err(SyncError::Lookup(_))
        ));
    }
}
