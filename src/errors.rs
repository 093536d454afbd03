// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for synchronization runs

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{HostSetError, NetifError, RoleExtractionError};

/// Errors that can occur while loading, classifying or deploying
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed inventory or hieradata document
    #[error("error while parsing {path}: {source}")]
    SourceParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Entity referenced by one source but unknown to another
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Equipment name does not follow the cluster naming convention
    #[error(transparent)]
    RoleExtraction(#[from] RoleExtractionError),

    /// Invalid host-set expression in the inventory
    #[error(transparent)]
    HostSet(#[from] HostSetError),

    /// Invalid network attachment
    #[error(transparent)]
    Netif(#[from] NetifError),

    /// External certificate or encryption tool failure
    #[error("external tool {tool} failed: {detail}")]
    ExternalTool { tool: String, detail: String },

    /// Filesystem error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Template rendering error
    #[error("rendering error: {0}")]
    Render(String),
}

impl SyncError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn parse(path: impl AsRef<Path>, source: serde_yaml::Error) -> Self {
        SyncError::SourceParse {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

impl From<handlebars::RenderError> for SyncError {
    fn from(err: handlebars::RenderError) -> Self {
        SyncError::Render(err.to_string())
    }
}

impl From<handlebars::TemplateError> for SyncError {
    fn from(err: handlebars::TemplateError) -> Self {
        SyncError::Render(err.to_string())
    }
}
