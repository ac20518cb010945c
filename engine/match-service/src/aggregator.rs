//! Match aggregator: fetch, enrich and cache upcoming fixtures
//!
//! The aggregator owns the [`MatchCache`] and the configured
//! [`FixtureSource`]. Fetch failures never reach callers; they are logged and
//! resolved by the failure policy in [`CacheConfig`].

use chrono::{DateTime, Duration, Utc};
use fixture_fetcher::{FixtureSource, Match};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use crate::cache::MatchCache;
use crate::config::CacheConfig;

/// What a refresh did to the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The source answered; the cache now holds `count` fixtures
    Updated { count: usize },
    /// The source could not be read
    Failed { error: String },
}

pub struct MatchAggregator {
    source: Box<dyn FixtureSource>,
    cache: RwLock<MatchCache>,
    refresh_lock: Mutex<()>,
    stale_after: Duration,
    keep_previous_on_failure: bool,
}

impl MatchAggregator {
    pub fn new(source: Box<dyn FixtureSource>, config: &CacheConfig) -> Self {
        Self {
            source,
            cache: RwLock::new(MatchCache::new()),
            refresh_lock: Mutex::new(()),
            stale_after: config.stale_after(),
            keep_previous_on_failure: config.keep_previous_on_failure,
        }
    }

    /// Fetch and replace the cache unconditionally
    pub async fn refresh(&self) -> RefreshOutcome {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Cached fixtures, refreshed first when the cache is empty or stale
    pub async fn get_matches(&self) -> Vec<Match> {
        self.get_matches_at(Utc::now()).await
    }

    /// [`get_matches`](Self::get_matches) with staleness judged at `now`
    pub async fn get_matches_at(&self, now: DateTime<Utc>) -> Vec<Match> {
        let seen = {
            let cache = self.cache.read().await;
            if !cache.needs_refresh_at(now, self.stale_after) {
                return cache.records().to_vec();
            }
            cache.last_refreshed()
        };

        let _guard = self.refresh_lock.lock().await;

        // A concurrent request may have refreshed while we waited
        {
            let cache = self.cache.read().await;
            if cache.last_refreshed() != seen {
                return cache.records().to_vec();
            }
        }

        self.refresh_locked().await;
        self.cache.read().await.records().to_vec()
    }

    /// When the cache was last written
    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.cache.read().await.last_refreshed()
    }

    /// Number of cached fixtures, without triggering a refresh
    pub async fn cached_count(&self) -> usize {
        self.cache.read().await.records().len()
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    async fn refresh_locked(&self) -> RefreshOutcome {
        info!("Updating match data from {}", self.source.name());

        // Fetch outside the cache lock so readers are not blocked
        let fetched = self.source.fetch_upcoming().await;
        let now = Utc::now();

        let mut cache = self.cache.write().await;
        match fetched {
            Ok(matches) => {
                let count = matches.len();
                cache.replace(matches, now);
                info!("Successfully updated match data. {} matches found.", count);
                RefreshOutcome::Updated { count }
            }
            Err(e) => {
                error!("Failed to update match data: {}", e);
                if self.keep_previous_on_failure {
                    cache.touch(now);
                } else {
                    cache.replace(Vec::new(), now);
                }
                RefreshOutcome::Failed { error: e.to_string() }
            }
        }
    }
}
