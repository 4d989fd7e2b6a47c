use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::asset::{embedded_asset, AssetLocation, StagingMethod};
use crate::config::AppConfig;
use crate::db::open_database;
use crate::error::ProvisionError;

use super::location::DbLocation;
use super::transfer::{FsTransfer, Transfer};

/// What staging did on this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingOutcome {
    /// The asset was transferred to the target path.
    Fresh { method: StagingMethod, bytes: u64 },
    /// The target file already existed; nothing was transferred.
    AlreadyPresent,
    /// The transfer failed and was logged. The target is still missing.
    StagingFailed { method: StagingMethod, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub path: PathBuf,
    /// Whether this run had to create the database directory.
    pub created_dir: bool,
    pub outcome: StagingOutcome,
}

/// A staged database plus the open handle to it.
#[derive(Debug)]
pub struct Provisioned {
    pub connection: Connection,
    pub report: ProvisionReport,
}

/// Makes sure a local copy of the seed database exists, then opens it.
///
/// Staging is create-if-missing: an existing target file is never replaced or
/// repaired. Transfer failures are absorbed into [`StagingOutcome::StagingFailed`];
/// directory and open failures abort.
pub struct Provisioner<T = FsTransfer> {
    location: DbLocation,
    asset: AssetLocation,
    transfer: T,
    io_timeout: Duration,
    /// Serializes staging so overlapping load cycles never share a partial file.
    staging: Mutex<()>,
}

impl Provisioner<FsTransfer> {
    pub fn from_config(config: &AppConfig) -> Result<Self, ProvisionError> {
        let asset = AssetLocation::parse(&config.asset_location)?;
        Ok(Self::new(
            config.db_location(),
            asset,
            FsTransfer::default(),
            config.io_timeout(),
        ))
    }
}

impl<T: Transfer> Provisioner<T> {
    pub fn new(location: DbLocation, asset: AssetLocation, transfer: T, io_timeout: Duration) -> Self {
        Self {
            location,
            asset,
            transfer,
            io_timeout,
            staging: Mutex::new(()),
        }
    }

    pub fn location(&self) -> &DbLocation {
        &self.location
    }

    pub fn asset(&self) -> &AssetLocation {
        &self.asset
    }

    /// Stage the asset if needed and open the result.
    pub async fn provision(&self) -> Result<Provisioned, ProvisionError> {
        let report = self.stage().await?;
        let connection = self.open().await?;
        info!(
            path = %report.path.display(),
            created_dir = report.created_dir,
            outcome = ?report.outcome,
            "database provisioned"
        );
        Ok(Provisioned { connection, report })
    }

    /// Ensure the directory exists and the asset has been staged, without
    /// opening anything.
    pub async fn stage(&self) -> Result<ProvisionReport, ProvisionError> {
        let _staging = self.staging.lock().await;
        let created_dir = self.ensure_dir().await?;
        let target = self.location.file();

        let present = self
            .bounded("target check", async {
                tokio::fs::try_exists(target)
                    .await
                    .map_err(|source| ProvisionError::TargetCheck {
                        path: target.to_path_buf(),
                        source,
                    })
            })
            .await?;
        if present {
            debug!(path = %target.display(), "database already present; skipping staging");
            return Ok(ProvisionReport {
                path: target.to_path_buf(),
                created_dir,
                outcome: StagingOutcome::AlreadyPresent,
            });
        }

        let method = self.asset.staging_method();
        let embedded = match &self.asset {
            AssetLocation::Embedded(name) => Some(embedded_asset(name)?),
            _ => None,
        };

        let partial = self.location.partial_file();
        let transferred = self
            .bounded("asset transfer", self.transfer_into_place(embedded, &partial, target))
            .await;

        let outcome = match transferred {
            Ok(bytes) => {
                info!(asset = %self.asset, %method, bytes, "asset staged");
                StagingOutcome::Fresh { method, bytes }
            }
            Err(err) if err.is_transfer_failure() || matches!(err, ProvisionError::Timeout { .. }) => {
                let reason = err.to_string();
                warn!(asset = %self.asset, %method, error = %reason, "asset staging failed");
                let _ = tokio::fs::remove_file(&partial).await;
                StagingOutcome::StagingFailed { method, reason }
            }
            Err(err) => return Err(err),
        };

        Ok(ProvisionReport {
            path: target.to_path_buf(),
            created_dir,
            outcome,
        })
    }

    /// Open whatever is at the target path. The file must exist: a missing
    /// database is an error, never silently created empty.
    pub async fn open(&self) -> Result<Connection, ProvisionError> {
        let path = self.location.file().to_path_buf();
        let task = tokio::task::spawn_blocking(move || {
            open_database(&path).map_err(|source| ProvisionError::DatabaseOpen { path, source })
        });
        self.bounded("database open", async {
            task.await.map_err(ProvisionError::Worker)?
        })
        .await
    }

    /// Returns whether the directory had to be created.
    async fn ensure_dir(&self) -> Result<bool, ProvisionError> {
        let dir = self.location.dir();
        let dir_err = |source: io::Error| ProvisionError::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        };

        let exists = self
            .bounded("directory check", async {
                match tokio::fs::metadata(dir).await {
                    Ok(meta) if meta.is_dir() => Ok(true),
                    Ok(_) => Err(dir_err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "path exists but is not a directory",
                    ))),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
                    Err(err) => Err(dir_err(err)),
                }
            })
            .await?;
        if exists {
            return Ok(false);
        }

        self.bounded("directory create", async {
            tokio::fs::create_dir_all(dir).await.map_err(dir_err)
        })
        .await?;
        info!(path = %dir.display(), "created database directory");
        Ok(true)
    }

    async fn transfer_into_place(
        &self,
        embedded: Option<&'static [u8]>,
        partial: &Path,
        target: &Path,
    ) -> Result<u64, ProvisionError> {
        let bytes = match (&self.asset, embedded) {
            (_, Some(bytes)) => self.transfer.write_embedded(bytes, partial).await?,
            (AssetLocation::LocalFile(source), None) => {
                self.transfer.copy_file(source, partial).await?
            }
            (AssetLocation::Remote(url), None) => self.transfer.download(url, partial).await?,
            (AssetLocation::Embedded(name), None) => {
                return Err(ProvisionError::UnknownEmbeddedAsset(name.clone()));
            }
        };

        tokio::fs::rename(partial, target)
            .await
            .map_err(|source| ProvisionError::AssetWrite {
                path: target.to_path_buf(),
                source,
            })?;
        Ok(bytes)
    }

    async fn bounded<R>(
        &self,
        stage: &'static str,
        fut: impl Future<Output = Result<R, ProvisionError>>,
    ) -> Result<R, ProvisionError> {
        timeout(self.io_timeout, fut)
            .await
            .map_err(|_| ProvisionError::Timeout { stage })?
    }
}
