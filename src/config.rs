//! Runtime configuration. Every path, the asset location, the SQL text and the
//! timings live in one value that the provisioner and loader receive
//! explicitly, so tests can point them at scratch directories.

use std::path::PathBuf;
use std::time::Duration;

use directories::BaseDirs;
use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::provision::DbLocation;

/// Folder name used beneath the platform data directory.
pub const APP_DIR_NAME: &str = "seedview";
/// Prefix for environment overrides, e.g. `SEEDVIEW_ASSET_LOCATION`.
pub const ENV_PREFIX: &str = "SEEDVIEW_";
/// Log file written inside the data root while the TUI owns the terminal.
pub const LOG_FILE_NAME: &str = "seedview.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root for application data. `None` resolves to the platform data dir.
    pub data_dir: Option<PathBuf>,
    pub db_dir_name: String,
    pub db_file_name: String,
    /// Where the seed database comes from: `asset:data.db`, `file://...`,
    /// a bare path, or an `http(s)` URL.
    pub asset_location: String,
    pub query: String,
    /// Column used to key each rendered line.
    pub key_column: String,
    /// Column whose value is rendered for each row.
    pub label_column: String,
    pub reveal_delay_ms: u64,
    pub io_timeout_ms: u64,
    pub loglevel: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_dir_name: "SQLite".to_string(),
            db_file_name: "data.db".to_string(),
            asset_location: "asset:data.db".to_string(),
            query: "select * from classes order by nm_nome".to_string(),
            key_column: "id".to_string(),
            label_column: "nm_nome".to_string(),
            reveal_delay_ms: 3000,
            io_timeout_ms: 10_000,
            loglevel: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overlaid with `SEEDVIEW_*` environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
    }

    /// Resolve the data root, falling back to the platform data directory and
    /// finally to the working directory when no home can be located.
    pub fn data_root(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        match BaseDirs::new() {
            Some(base) => base.data_dir().join(APP_DIR_NAME),
            None => PathBuf::from(".").join(APP_DIR_NAME),
        }
    }

    pub fn db_location(&self) -> DbLocation {
        DbLocation::new(self.data_root(), &self.db_dir_name, &self.db_file_name)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_root().join(LOG_FILE_NAME)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_seeded_schema() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.query, "select * from classes order by nm_nome");
        assert_eq!(cfg.label_column, "nm_nome");
        assert_eq!(cfg.reveal_delay(), Duration::from_secs(3));
    }

    #[test]
    fn explicit_data_dir_drives_the_db_location() {
        let cfg = AppConfig {
            data_dir: Some(PathBuf::from("/srv/seed")),
            ..AppConfig::default()
        };
        let location = cfg.db_location();
        assert_eq!(location.dir(), PathBuf::from("/srv/seed/SQLite").as_path());
        assert_eq!(
            location.file(),
            PathBuf::from("/srv/seed/SQLite/data.db").as_path()
        );
        assert_eq!(cfg.log_path(), PathBuf::from("/srv/seed/seedview.log"));
    }

    #[test]
    fn environment_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SEEDVIEW_REVEAL_DELAY_MS", "25");
            jail.set_env("SEEDVIEW_ASSET_LOCATION", "https://example/data.db");
            let cfg = AppConfig::load()?;
            assert_eq!(cfg.reveal_delay_ms, 25);
            assert_eq!(cfg.asset_location, "https://example/data.db");
            assert_eq!(cfg.db_file_name, "data.db");
            Ok(())
        });
    }
}
