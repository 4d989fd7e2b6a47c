//! Where the seed database comes from. The location string is resolved once
//! into an [`AssetLocation`], and the location alone decides whether staging
//! copies bytes or downloads them.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::error::ProvisionError;

/// Name the bundled database is exposed under (`asset:data.db`).
pub const EMBEDDED_ASSET_NAME: &str = "data.db";

/// Seed database packaged into the binary at build time.
static EMBEDDED_DATA_DB: &[u8] = include_bytes!("../assets/data.db");

/// Look up an embedded asset by name.
pub fn embedded_asset(name: &str) -> Result<&'static [u8], ProvisionError> {
    if name == EMBEDDED_ASSET_NAME {
        Ok(EMBEDDED_DATA_DB)
    } else {
        Err(ProvisionError::UnknownEmbeddedAsset(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    /// Packaged with the application (`asset:` scheme).
    Embedded(String),
    /// Already materialized on the local filesystem.
    LocalFile(PathBuf),
    /// Reachable over `http` or `https`.
    Remote(Url),
}

/// How an asset reaches the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingMethod {
    Copy,
    Download,
}

impl fmt::Display for StagingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StagingMethod::Copy => f.write_str("copy"),
            StagingMethod::Download => f.write_str("download"),
        }
    }
}

impl AssetLocation {
    pub fn parse(location: &str) -> Result<Self, ProvisionError> {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return Err(ProvisionError::InvalidLocation {
                location: location.to_string(),
                reason: "empty location".to_string(),
            });
        }

        let url = match Url::parse(trimmed) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Ok(AssetLocation::LocalFile(PathBuf::from(trimmed)));
            }
            Err(err) => {
                return Err(ProvisionError::InvalidLocation {
                    location: location.to_string(),
                    reason: err.to_string(),
                });
            }
        };

        match url.scheme() {
            "asset" => {
                let name = url.path().trim_start_matches('/');
                if name.is_empty() {
                    return Err(ProvisionError::InvalidLocation {
                        location: location.to_string(),
                        reason: "missing asset name".to_string(),
                    });
                }
                Ok(AssetLocation::Embedded(name.to_string()))
            }
            "file" => url
                .to_file_path()
                .map(AssetLocation::LocalFile)
                .map_err(|_| ProvisionError::InvalidLocation {
                    location: location.to_string(),
                    reason: "not a local file path".to_string(),
                }),
            "http" | "https" => Ok(AssetLocation::Remote(url)),
            // Windows drive letters parse as one-letter schemes.
            scheme if scheme.len() == 1 => Ok(AssetLocation::LocalFile(PathBuf::from(trimmed))),
            scheme => Err(ProvisionError::UnsupportedScheme(scheme.to_string())),
        }
    }

    pub fn staging_method(&self) -> StagingMethod {
        match self {
            AssetLocation::Embedded(_) | AssetLocation::LocalFile(_) => StagingMethod::Copy,
            AssetLocation::Remote(_) => StagingMethod::Download,
        }
    }
}

impl FromStr for AssetLocation {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetLocation::parse(s)
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetLocation::Embedded(name) => write!(f, "asset:{name}"),
            AssetLocation::LocalFile(path) => write!(f, "{}", path.display()),
            AssetLocation::Remote(url) => write!(f, "{url}"),
        }
    }
}
