//! Binary entry point: load configuration, route logs to a file (the TUI owns
//! the terminal), start the runtime that drives load cycles, and run the
//! Ratatui event loop until the user exits.
use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use seedview::{run_app, App, AppConfig, Loader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config)?;

    info!(
        data_dir = %config.data_root().display(),
        asset = %config.asset_location,
        loglevel = %config.loglevel,
        "starting seedview"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let loader = Arc::new(Loader::from_config(&config).context("invalid asset location")?);

    let mut app = App::new(runtime.handle().clone(), loader, &config);
    run_app(&mut app)
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let root = config.data_root();
    fs::create_dir_all(&root).context("failed to create data directory")?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
        .context("failed to open log file")?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false)
                .with_level(true)
                .with_target(false),
        )
        .init();
    Ok(())
}
