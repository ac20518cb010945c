//! Common interface over the API fetcher and the HTML scraper

use async_trait::async_trait;
use tracing::info;

use crate::api::FootballDataFetcher;
use crate::config::FetcherConfig;
use crate::error::FetchResult;
use crate::models::Match;
use crate::page_scraper::FixtureScraper;

/// Anything that can produce the current batch of upcoming fixtures
#[async_trait]
pub trait FixtureSource: Send + Sync {
    /// Fetch upcoming fixtures with both teams' form attached.
    ///
    /// `Ok(vec![])` means the source answered with no fixtures; an `Err`
    /// means the source could not be read.
    async fn fetch_upcoming(&self) -> FetchResult<Vec<Match>>;

    /// Short label for logs
    fn name(&self) -> &'static str;
}

/// Pick the API fetcher or the scraper according to `config.use_api`
pub fn source_from_config(config: &FetcherConfig) -> Box<dyn FixtureSource> {
    if config.use_api {
        info!("Using football-data API at {}", config.api.base_url);
        Box::new(FootballDataFetcher::new(config.clone()))
    } else {
        info!("Using HTML scraper at {}", config.scraper.url);
        Box::new(FixtureScraper::new(config.clone()))
    }
}
