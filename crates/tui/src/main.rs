mod app;
mod config;
mod error;
mod local_state;
mod ui;

use std::{fs::OpenOptions, sync::Arc};

use tracing_subscriber::EnvFilter;

use crate::{config::AppConfig, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    setup_logging(&config)?;
    tracing::info!(base_url = %config.base_url, "starting moneyflow");

    let mut app = app::App::new(config)?;
    app.run()?;
    Ok(())
}

/// The terminal belongs to the UI, so logs go to a file.
fn setup_logging(config: &AppConfig) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "moneyflow_tui={level},client={level}",
            level = config.log_level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .init();
    Ok(())
}
