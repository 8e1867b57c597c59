use anyhow::Result;
use btc_sentiment_cache::core::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for btc_sentiment_cache::AppCommand {
    fn from(cmd: Commands) -> btc_sentiment_cache::AppCommand {
        match cmd {
            Commands::Init => btc_sentiment_cache::AppCommand::Init,
            Commands::Refresh { samples } => btc_sentiment_cache::AppCommand::Refresh { samples },
            Commands::Read => btc_sentiment_cache::AppCommand::Read,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Create the price and sentiment series
    Init,
    /// Ingest samples from a JSON file and recompute the summary
    Refresh {
        /// JSON array of sentiment samples
        #[arg(short, long)]
        samples: PathBuf,
    },
    /// Print the cached summary, computing it on a miss
    Read,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => {
            btc_sentiment_cache::run_command(cmd.into(), cli.config_path.as_deref())
                .await
                .map(|output| {
                    if let Some(json) = output {
                        println!("{json}");
                    }
                })
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = btc_sentiment_cache::core::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
store:
  url: "redis://redis:6379/0"
  backend: redis

key_prefix: "cache-key-prefix"
cache_ttl_secs: 120

window:
  # How far back the summary looks, in seconds
  lookback_secs: 10800
  # Width of each averaging bucket, in milliseconds
  bucket_ms: 3600000
  pairing: positional
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
