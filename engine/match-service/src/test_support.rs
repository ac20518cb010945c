//! Shared helpers for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fixture_fetcher::{
    Competition, FetchError, FetchResult, FixtureSource, FormResult, FormStatus, Match, TeamRef,
};

/// Source that replays scripted responses and counts calls
pub struct ScriptedSource {
    responses: Mutex<VecDeque<FetchResult<Vec<Match>>>>,
    calls: Arc<AtomicUsize>,
    pub latency: Duration,
}

impl ScriptedSource {
    pub fn new(responses: Vec<FetchResult<Vec<Match>>>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Self {
            responses: Mutex::new(responses.into()),
            calls: calls.clone(),
            latency: Duration::ZERO,
        };
        (source, calls)
    }
}

#[async_trait]
impl FixtureSource for ScriptedSource {
    async fn fetch_upcoming(&self) -> FetchResult<Vec<Match>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Malformed("no scripted response".to_string())))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Scheduled fixture with a full five-match form for both teams
pub fn fixture(id: &str) -> Match {
    use FormResult::*;
    Match {
        id: id.to_string(),
        competition: Competition { name: "Premier League".to_string(), code: "PL".to_string() },
        home_team: TeamRef {
            id: Some(57),
            name: "Arsenal".to_string(),
            logo: "https://crests.football-data.org/57.png".to_string(),
            last_five_matches: vec![Win, Win, Loss, Draw, Loss],
            form_status: FormStatus::Available,
        },
        away_team: TeamRef {
            id: Some(61),
            name: "Chelsea".to_string(),
            logo: "https://crests.football-data.org/61.png".to_string(),
            last_five_matches: vec![Draw, Win, Win, Loss, Draw],
            form_status: FormStatus::Available,
        },
        match_time: "2025-05-05T14:00:00Z".to_string(),
        status: "SCHEDULED".to_string(),
    }
}
