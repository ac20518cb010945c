//! Match Service
//!
//! Serves upcoming football fixtures, enriched with each team's last five
//! results, as JSON and CSV over HTTP. Fixtures come from the
//! `fixture-fetcher` crate and are cached in memory between refreshes.

use anyhow::{Context, Result};

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod rest_api;
pub mod scheduler;
pub mod service;
pub mod signals;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod integration_tests;

pub use crate::aggregator::{MatchAggregator, RefreshOutcome};
pub use crate::cache::MatchCache;
pub use crate::config::ServiceConfig;
pub use crate::error::{ExportError, ServiceError, ServiceResult};
pub use crate::export::CsvExporter;
pub use crate::logging::initialize_logging;
pub use crate::rest_api::create_routes;
pub use crate::scheduler::RefreshScheduler;
pub use crate::service::MatchService;
pub use crate::signals::shutdown_signal;

/// Load configuration from `.env`, the config file and environment variables
pub fn load_configuration() -> Result<ServiceConfig> {
    crate::config::load_config().context("Failed to load service configuration")
}
