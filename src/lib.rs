pub mod aggregate;
pub mod core;
pub mod ingest;
pub mod result_cache;
pub mod service;
pub mod store;
pub mod writer;

use crate::core::Sample;
use crate::core::config::AppConfig;
use crate::service::SentimentService;
use crate::store::Stores;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

pub enum AppCommand {
    Init,
    Refresh { samples: PathBuf },
    Read,
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
}

pub fn read_samples(path: &std::path::Path) -> Result<Vec<Sample>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read samples file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse samples file: {}", path.display()))
}

/// Runs one command and returns the JSON to print, if any.
pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<Option<String>> {
    info!("Sentiment cache starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    let stores = Stores::open(&config.store)
        .await
        .context("Failed to open store")?;
    let (service, writer_handle) = SentimentService::from_config(stores, &config);
    service
        .initialize()
        .await
        .context("Failed to initialize series")?;

    let output = match command {
        AppCommand::Init => None,
        AppCommand::Refresh { samples } => {
            let samples = read_samples(&samples)?;
            let entry = service.refresh(&samples).await?;
            Some(serde_json::to_string_pretty(&entry)?)
        }
        AppCommand::Read => {
            let entry = service.read_or_compute().await?;
            Some(serde_json::to_string_pretty(&entry)?)
        }
    };

    // Let the deferred cache write finish before the process exits
    drop(service);
    writer_handle.await.context("Cache writer panicked")?;
    Ok(output)
}
