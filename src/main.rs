//! Status Board - Main Entry Point
//!
//! Usage: `status-board [CONFIG_PATH]`

use std::path::PathBuf;

use anyhow::Context;
use status_board::app::application::run_app;
use status_board::services::block_on;
use status_board::utils::{config_store, logging};

fn main() -> anyhow::Result<()> {
    let config_path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => config_store::default_config_path()?,
    };

    let config = block_on(config_store::load_or_init_config(&config_path))
        .with_context(|| format!("loading {}", config_path.display()))?;

    let _log_guard = logging::init(&config.log)?;

    tracing::info!("Starting Status Board with {}", config_path.display());

    run_app(config)?;
    Ok(())
}
