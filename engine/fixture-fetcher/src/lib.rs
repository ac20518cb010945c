//! Fixture Fetcher
//!
//! Fetches upcoming football fixtures and each team's recent form. The
//! primary source is a football-data.org style JSON API; when the API is
//! disabled an HTML fixtures page is scraped instead. Both sources sit
//! behind the [`FixtureSource`] trait.

pub mod api;
pub mod config;
pub mod disguise;
pub mod error;
pub mod form;
pub mod models;
pub mod page_scraper;
pub mod source;

pub use api::FootballDataFetcher;
pub use config::{DelayBounds, FetcherConfig};
pub use error::{FetchError, FetchResult};
pub use models::*;
pub use page_scraper::FixtureScraper;
pub use source::{source_from_config, FixtureSource};
