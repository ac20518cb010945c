//! In-memory fixture cache
//!
//! Holds the last fetched batch and when it was stored. Batches are replaced
//! wholesale; nothing is merged.

use chrono::{DateTime, Duration, Utc};
use fixture_fetcher::Match;

#[derive(Debug, Clone, Default)]
pub struct MatchCache {
    records: Vec<Match>,
    last_refreshed: Option<DateTime<Utc>>,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Match] {
        &self.records
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the batch and stamp it with `at`
    pub fn replace(&mut self, records: Vec<Match>, at: DateTime<Utc>) {
        self.records = records;
        self.last_refreshed = Some(at);
    }

    /// Stamp the current batch with `at` without changing it
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_refreshed = Some(at);
    }

    /// Age of the batch at `now`, if it was ever refreshed
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_refreshed.map(|at| now - at)
    }

    /// Whether `now` requires a refresh before serving: the cache is empty,
    /// was never refreshed, or is at least `stale_after` old.
    pub fn needs_refresh_at(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        if self.records.is_empty() {
            return true;
        }
        match self.age_at(now) {
            Some(age) => age >= stale_after,
            None => true,
        }
    }
}
