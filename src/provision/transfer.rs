use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::error::ProvisionError;

/// Moves asset bytes onto the local filesystem. The provisioner decides which
/// method to call; implementations only perform the transfer.
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Copy an already materialized local file. Returns bytes written.
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<u64, ProvisionError>;

    /// Write an asset packaged inside the binary.
    async fn write_embedded(&self, bytes: &'static [u8], to: &Path)
        -> Result<u64, ProvisionError>;

    /// Fetch a remote asset over HTTP(S).
    async fn download(&self, url: &Url, to: &Path) -> Result<u64, ProvisionError>;
}

/// Production transfer backed by `tokio::fs` and `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct FsTransfer {
    client: reqwest::Client,
}

impl FsTransfer {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transfer for FsTransfer {
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<u64, ProvisionError> {
        tokio::fs::copy(from, to)
            .await
            .map_err(|source| ProvisionError::AssetCopy {
                path: to.to_path_buf(),
                source,
            })
    }

    async fn write_embedded(
        &self,
        bytes: &'static [u8],
        to: &Path,
    ) -> Result<u64, ProvisionError> {
        tokio::fs::write(to, bytes)
            .await
            .map_err(|source| ProvisionError::AssetWrite {
                path: to.to_path_buf(),
                source,
            })?;
        Ok(bytes.len() as u64)
    }

    async fn download(&self, url: &Url, to: &Path) -> Result<u64, ProvisionError> {
        let download_err = |source| ProvisionError::AssetDownload {
            url: url.to_string(),
            source,
        };
        let write_err = |source| ProvisionError::AssetWrite {
            path: to.to_path_buf(),
            source,
        };

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(download_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProvisionError::DownloadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(to).await.map_err(write_err)?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(download_err)? {
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;

        debug!(url = %url, bytes = written, "asset download complete");
        Ok(written)
    }
}
