//! Error types for the provisioning and loading layers. Display strings carry
//! the full context for logs; the view shows only the innermost cause through
//! [`surface_error`].

use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while staging the bundled asset and opening the local copy.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to create database directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to check for database at {path}: {source}")]
    TargetCheck {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to copy asset to {path}: {source}")]
    AssetCopy {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write asset to {path}: {source}")]
    AssetWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to download asset from {url}: {source}")]
    AssetDownload {
        url: String,
        source: reqwest::Error,
    },

    #[error("asset download from {url} returned status {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("unsupported asset scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid asset location {location:?}: {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("unknown embedded asset: {0}")]
    UnknownEmbeddedAsset(String),

    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("timed out during {stage}")]
    Timeout { stage: &'static str },

    #[error("database worker stopped unexpectedly: {0}")]
    Worker(#[source] tokio::task::JoinError),
}

impl ProvisionError {
    /// Transfer failures are absorbed into the staging report instead of
    /// aborting provisioning.
    pub fn is_transfer_failure(&self) -> bool {
        matches!(
            self,
            ProvisionError::AssetCopy { .. }
                | ProvisionError::AssetWrite { .. }
                | ProvisionError::AssetDownload { .. }
                | ProvisionError::DownloadStatus { .. }
        )
    }
}

/// Failures that end a load cycle and flip the view into its error state.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("transaction failed: {0}")]
    Transaction(#[source] rusqlite::Error),

    #[error("{0}")]
    Query(#[source] rusqlite::Error),

    #[error("timed out during {stage}")]
    Timeout { stage: &'static str },

    #[error("database worker stopped unexpectedly: {0}")]
    Worker(#[source] tokio::task::JoinError),
}

impl LoadError {
    /// Label used when logging the failure, one per stage of the cycle.
    pub fn stage_label(&self) -> &'static str {
        match self {
            LoadError::Provision(_) => "database error",
            LoadError::Transaction(_) => "transaction error",
            LoadError::Query(_) => "sql error",
            LoadError::Timeout { .. } => "timeout",
            LoadError::Worker(_) => "worker error",
        }
    }
}

/// The innermost cause of `err`, as the view should show it.
///
/// The walk stops at a `rusqlite::Error`: its own source is the bare result
/// code, which drops the driver message (`no such table: ...`).
pub fn surface_error(err: &(dyn StdError + 'static)) -> String {
    let mut cause = err;
    while let Some(next) = cause.source() {
        if cause.is::<rusqlite::Error>() {
            break;
        }
        cause = next;
    }
    cause.to_string()
}
