//! Core library surface for the seedview terminal application.
//!
//! The binary stages a bundled SQLite database into the user's data
//! directory, runs one query against it, and renders the rows. The same
//! pieces are exposed here so tests and other tooling can drive a load cycle
//! without a terminal.
pub mod asset;
pub mod config;
pub mod db;
pub mod error;
pub mod load;
pub mod models;
pub mod provision;
pub mod ui;

pub use asset::{AssetLocation, StagingMethod};
pub use config::AppConfig;
pub use error::{surface_error, LoadError, ProvisionError};
pub use load::{CancellationToken, LoadEvent, LoadState, Loader, Publisher};
pub use models::{ColumnValue, RowRecord};
pub use provision::{DbLocation, Provisioner, StagingOutcome};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
