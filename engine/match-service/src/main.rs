//! Match Service entry point
//!
//! Loads configuration, initializes logging, and serves upcoming fixtures
//! until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use tracing::info;

use match_service::{initialize_logging, load_configuration, MatchService};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first so the log level can come from it
    let config = load_configuration()?;

    initialize_logging(config.effective_log_level(), &config.logging.format)?;

    info!("Starting Match Service v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded successfully");

    let service = MatchService::new(config).context("Failed to initialize match service")?;
    service.run().await?;

    Ok(())
}
