//! Service state and component wiring

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use fixture_fetcher::source_from_config;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::aggregator::{MatchAggregator, RefreshOutcome};
use crate::config::ServiceConfig;
use crate::export::CsvExporter;
use crate::rest_api::create_routes;
use crate::scheduler::RefreshScheduler;
use crate::signals::shutdown_signal;

/// Initialized components of the match service
pub struct MatchService {
    /// Service configuration
    pub config: ServiceConfig,

    /// Fixture cache and its source
    pub aggregator: Arc<MatchAggregator>,

    /// CSV writer for downloads
    pub exporter: Arc<CsvExporter>,
}

impl MatchService {
    /// Build the fixture source, cache and exporter from `config`
    pub fn new(config: ServiceConfig) -> Result<Self> {
        info!("Initializing service components...");

        config.fetcher.validate().context("Invalid fetcher configuration")?;
        let source = source_from_config(&config.fetcher);
        info!("Using fixture source: {}", source.name());

        let aggregator = Arc::new(MatchAggregator::new(source, &config.cache));
        let exporter = Arc::new(CsvExporter::new(config.export.temp_dir.clone()));

        Ok(Self { config, aggregator, exporter })
    }

    /// Serve HTTP until a shutdown signal arrives
    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = self.config.server_addr().context("Invalid server address")?;

        if self.config.scheduler.refresh_on_startup {
            info!("Fetching fixtures on startup...");
            match self.aggregator.refresh().await {
                RefreshOutcome::Updated { count } => info!("Startup fetch loaded {} matches", count),
                RefreshOutcome::Failed { error } => warn!("Startup fetch failed: {}", error),
            }
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler_handle = if self.config.scheduler.enabled {
            let scheduler =
                RefreshScheduler::new(self.aggregator.clone(), self.config.refresh_interval());
            Some(scheduler.spawn(shutdown_rx))
        } else {
            info!("Background refresh disabled");
            None
        };

        let routes = create_routes(
            self.aggregator.clone(),
            self.exporter.clone(),
            self.config.server.static_dir.clone(),
        );

        let (bound, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(addr, shutdown_signal())
            .context("Failed to bind HTTP server")?;
        info!("Match service listening on http://{}", bound);

        server.await;
        info!("Shutdown signal received. Stopping background tasks...");

        let _ = shutdown_tx.send(true);
        if let Some(handle) = scheduler_handle {
            if let Err(e) = handle.await {
                warn!("Refresh scheduler did not stop cleanly: {}", e);
            }
        }

        info!("Match service shutdown complete");
        Ok(())
    }
}
