//! End-to-end tests: real fetchers against a local mock upstream, served
//! through the HTTP routes

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use fixture_fetcher::{source_from_config, FetcherConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

use crate::aggregator::{MatchAggregator, RefreshOutcome};
use crate::config::CacheConfig;
use crate::export::CsvExporter;
use crate::rest_api::create_routes;

const API_TOKEN: &str = "test-token";

/// Team whose history endpoint answers 404 while `hide_history` is set
const TEAM_WITHOUT_HISTORY: u64 = 13;

#[derive(Default)]
struct MockUpstream {
    fail_fixtures: AtomicBool,
    hide_history: AtomicBool,
    fixture_calls: AtomicUsize,
    history_calls: AtomicUsize,
    page_calls: AtomicUsize,
}

fn fixture_list() -> Value {
    json!({
        "matches": [
            {
                "id": 1001,
                "competition": { "name": "Premier League", "code": "PL" },
                "homeTeam": { "id": 57, "name": "Arsenal", "crest": "https://crests.football-data.org/57.png" },
                "awayTeam": { "id": 61, "name": "Chelsea", "crest": "https://crests.football-data.org/61.png" },
                "utcDate": "2025-05-05T14:00:00Z",
                "status": "TIMED"
            },
            {
                "id": 1002,
                "competition": { "name": "Primera Division", "code": "PD" },
                "homeTeam": { "id": 81, "name": "FC Barcelona", "crest": "https://crests.football-data.org/81.png" },
                "awayTeam": { "id": TEAM_WITHOUT_HISTORY, "name": "Valencia CF", "crest": "https://crests.football-data.org/13.png" },
                "utcDate": "2025-05-06T19:00:00Z",
                "status": "SCHEDULED"
            }
        ]
    })
}

/// Five finished matches for `team_id` that read W, D, L, L, W from its side
fn team_history(team_id: u64) -> Value {
    let other = 999;
    let played = |home: u64, away: u64, home_goals: u32, away_goals: u32| {
        json!({
            "id": 1,
            "homeTeam": { "id": home },
            "awayTeam": { "id": away },
            "status": "FINISHED",
            "score": { "fullTime": { "home": home_goals, "away": away_goals } }
        })
    };

    json!({
        "matches": [
            played(team_id, other, 2, 0),
            played(other, team_id, 1, 1),
            played(other, team_id, 3, 1),
            played(team_id, other, 0, 1),
            played(other, team_id, 0, 2),
        ]
    })
}

const FIXTURES_PAGE: &str = r#"
<html><body>
  <div class="event__title">England: Premier League</div>
  <div class="event__match" id="g_1_Kx1pQ2">
    <div class="event__time">15:00</div>
    <div class="event__participant--home">Arsenal</div>
    <div class="event__participant--away">Chelsea</div>
  </div>
  <div class="event__match">
    <div class="event__participant--home">No Id FC</div>
  </div>
  <div class="event__title">Spain: LaLiga</div>
  <div class="event__match" id="g_1_Zt7wR9">
    <div class="event__time">Postponed</div>
    <div class="event__participant--home">Barcelona</div>
    <div class="event__participant--away">Real Madrid</div>
  </div>
</body></html>
"#;

fn json_response(body: &Value, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

/// Serve the mock upstream on an ephemeral port
fn spawn_mock_upstream(state: Arc<MockUpstream>) -> SocketAddr {
    let with_state = warp::any().map(move || state.clone());

    let fixtures = warp::path!("v4" / "matches")
        .and(warp::get())
        .and(warp::header::optional::<String>("x-auth-token"))
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state.clone())
        .map(|token: Option<String>, query: HashMap<String, String>, state: Arc<MockUpstream>| {
            state.fixture_calls.fetch_add(1, Ordering::SeqCst);
            if token.as_deref() != Some(API_TOKEN) {
                return json_response(&json!({ "message": "bad token" }), StatusCode::FORBIDDEN);
            }
            let dated = ["dateFrom", "dateTo"]
                .iter()
                .all(|key| query.get(*key).map_or(false, |d| d.len() == 10));
            if !dated {
                return json_response(&json!({ "message": "missing dates" }), StatusCode::BAD_REQUEST);
            }
            if state.fail_fixtures.load(Ordering::SeqCst) {
                return json_response(&json!({ "message": "down" }), StatusCode::SERVICE_UNAVAILABLE);
            }
            json_response(&fixture_list(), StatusCode::OK)
        });

    let history = warp::path!("v4" / "teams" / u64 / "matches")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state.clone())
        .map(|team_id: u64, query: HashMap<String, String>, state: Arc<MockUpstream>| {
            state.history_calls.fetch_add(1, Ordering::SeqCst);
            let finished = query.get("status").map(String::as_str) == Some("FINISHED")
                && query.get("limit").map(String::as_str) == Some("5");
            if !finished {
                return json_response(&json!({ "message": "bad query" }), StatusCode::BAD_REQUEST);
            }
            if team_id == TEAM_WITHOUT_HISTORY && state.hide_history.load(Ordering::SeqCst) {
                return json_response(&json!({ "message": "not found" }), StatusCode::NOT_FOUND);
            }
            json_response(&team_history(team_id), StatusCode::OK)
        });

    let page = warp::path("fixtures")
        .and(warp::get())
        .and(warp::header::<String>("user-agent"))
        .and(with_state)
        .map(|user_agent: String, state: Arc<MockUpstream>| {
            state.page_calls.fetch_add(1, Ordering::SeqCst);
            if !user_agent.starts_with("Mozilla/5.0") {
                return warp::reply::with_status("blocked", StatusCode::FORBIDDEN).into_response();
            }
            warp::reply::html(FIXTURES_PAGE).into_response()
        });

    let (addr, server) = warp::serve(fixtures.or(history).or(page)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn api_config(addr: SocketAddr) -> FetcherConfig {
    let mut config = FetcherConfig::default().without_delays();
    config.use_api = true;
    config.api.base_url = format!("http://{}/v4/", addr);
    config.api.api_key = API_TOKEN.to_string();
    config.http.timeout_secs = 5;
    config
}

fn scraper_config(addr: SocketAddr) -> FetcherConfig {
    let mut config = FetcherConfig::default().without_delays();
    config.use_api = false;
    config.scraper.url = format!("http://{}/fixtures", addr);
    config.http.timeout_secs = 5;
    config
}

fn aggregator_for(config: &FetcherConfig) -> Arc<MatchAggregator> {
    Arc::new(MatchAggregator::new(source_from_config(config), &CacheConfig::default()))
}

async fn get_json<F>(routes: &F, path: &str) -> Value
where
    F: Filter + 'static,
    F::Extract: Reply + Send,
{
    let response = warp::test::request().path(path).reply(routes).await;
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_slice(response.body()).unwrap()
}

#[tokio::test]
async fn test_api_fixtures_served_with_form() {
    let upstream = Arc::new(MockUpstream::default());
    let addr = spawn_mock_upstream(upstream.clone());
    let dir = TempDir::new().unwrap();

    let routes = create_routes(
        aggregator_for(&api_config(addr)),
        Arc::new(CsvExporter::new(dir.path())),
        None,
    );

    let body = get_json(&routes, "/api/matches").await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);

    let first = &items[0];
    assert_eq!(first["id"], "1001");
    assert_eq!(first["competition"], json!({ "name": "Premier League", "code": "PL" }));
    assert_eq!(first["matchTime"], "2025-05-05T14:00:00Z");
    assert_eq!(first["status"], "TIMED");
    assert_eq!(first["homeTeam"]["name"], "Arsenal");
    assert_eq!(first["homeTeam"]["logo"], "https://crests.football-data.org/57.png");
    assert_eq!(first["homeTeam"]["lastFiveMatches"], json!(["W", "D", "L", "L", "W"]));
    assert_eq!(first["homeTeam"]["formStatus"], "available");
    assert_eq!(first["awayTeam"]["lastFiveMatches"], json!(["W", "D", "L", "L", "W"]));

    for item in items {
        for side in ["homeTeam", "awayTeam"] {
            assert_eq!(item[side]["lastFiveMatches"].as_array().unwrap().len(), 5);
            assert_eq!(item[side]["formStatus"], "available");
        }
    }

    assert_eq!(upstream.fixture_calls.load(Ordering::SeqCst), 1);
    assert_eq!(upstream.history_calls.load(Ordering::SeqCst), 4);

    // Served from cache the second time
    let again = get_json(&routes, "/api/matches").await;
    assert_eq!(again, body);
    assert_eq!(upstream.fixture_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_team_history_marks_form_unavailable() {
    let upstream = Arc::new(MockUpstream::default());
    upstream.hide_history.store(true, Ordering::SeqCst);
    let addr = spawn_mock_upstream(upstream);
    let aggregator = aggregator_for(&api_config(addr));

    assert_eq!(aggregator.refresh().await, RefreshOutcome::Updated { count: 2 });
    let matches = aggregator.get_matches().await;

    let fixture = &matches[1];
    assert_eq!(fixture.home_team.last_five_matches.len(), 5);
    assert_eq!(fixture.away_team.name, "Valencia CF");
    assert_eq!(fixture.away_team.id, Some(TEAM_WITHOUT_HISTORY));
    assert!(fixture.away_team.last_five_matches.is_empty());
    assert_eq!(fixture.away_team.form_status, fixture_fetcher::FormStatus::Unavailable);
}

#[tokio::test]
async fn test_api_fixtures_as_csv() {
    let upstream = Arc::new(MockUpstream::default());
    upstream.hide_history.store(true, Ordering::SeqCst);
    let addr = spawn_mock_upstream(upstream);
    let dir = TempDir::new().unwrap();

    let routes = create_routes(
        aggregator_for(&api_config(addr)),
        Arc::new(CsvExporter::new(dir.path())),
        None,
    );

    let response = warp::test::request().path("/api/matches/csv").reply(&routes).await;
    assert_eq!(response.status(), StatusCode::OK);

    let text = std::str::from_utf8(response.body()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "1001,Premier League,Arsenal,Chelsea,2025-05-05 14:00,WDLLW,WDLLW");
    assert_eq!(lines[2], "1002,Primera Division,FC Barcelona,Valencia CF,2025-05-06 19:00,WDLLW,");

    // The export is removed once it has been sent
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unreachable_api_serves_empty_list() {
    // Grab a free port, then close it
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let aggregator = aggregator_for(&api_config(addr));
    let dir = TempDir::new().unwrap();
    let routes = create_routes(aggregator.clone(), Arc::new(CsvExporter::new(dir.path())), None);

    let body = get_json(&routes, "/api/matches").await;
    assert_eq!(body, json!([]));
    assert!(aggregator.last_refreshed().await.is_some());
}

#[tokio::test]
async fn test_upstream_outage_keeps_previous_fixtures() {
    let upstream = Arc::new(MockUpstream::default());
    let addr = spawn_mock_upstream(upstream.clone());
    let aggregator = aggregator_for(&api_config(addr));

    assert_eq!(aggregator.refresh().await, RefreshOutcome::Updated { count: 2 });
    let first_refresh = aggregator.last_refreshed().await.unwrap();

    upstream.fail_fixtures.store(true, Ordering::SeqCst);
    assert!(matches!(aggregator.refresh().await, RefreshOutcome::Failed { .. }));

    assert_eq!(aggregator.get_matches().await.len(), 2);
    assert!(aggregator.last_refreshed().await.unwrap() >= first_refresh);
    assert_eq!(upstream.fixture_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_wrong_token_is_a_failed_refresh() {
    let upstream = Arc::new(MockUpstream::default());
    let addr = spawn_mock_upstream(upstream.clone());
    let mut config = api_config(addr);
    config.api.api_key = "wrong".to_string();

    let aggregator = aggregator_for(&config);
    assert!(matches!(aggregator.refresh().await, RefreshOutcome::Failed { .. }));
    assert_eq!(aggregator.cached_count().await, 0);
    assert_eq!(upstream.history_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_scraped_fixtures_served_without_form() {
    let upstream = Arc::new(MockUpstream::default());
    let addr = spawn_mock_upstream(upstream.clone());
    let dir = TempDir::new().unwrap();

    let aggregator = aggregator_for(&scraper_config(addr));
    assert_eq!(aggregator.source_name(), "html-scraper");
    let routes = create_routes(aggregator, Arc::new(CsvExporter::new(dir.path())), None);

    let body = get_json(&routes, "/api/matches").await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 3);

    assert_eq!(items[0]["id"], "Kx1pQ2");
    assert_eq!(items[0]["competition"]["name"], "England: Premier League");
    assert_eq!(items[0]["homeTeam"]["name"], "Arsenal");
    assert_eq!(items[0]["awayTeam"]["name"], "Chelsea");
    assert_eq!(items[0]["status"], "SCHEDULED");
    assert_eq!(items[0]["homeTeam"]["formStatus"], "unavailable");
    assert_eq!(items[0]["homeTeam"]["lastFiveMatches"], json!([]));

    // Block without an id is kept with placeholders
    assert_eq!(items[1]["id"], "");
    assert_eq!(items[1]["competition"]["name"], "England: Premier League");
    assert_eq!(items[1]["homeTeam"]["name"], "No Id FC");
    assert_eq!(items[1]["awayTeam"]["name"], "Unknown");

    assert_eq!(items[2]["id"], "Zt7wR9");
    assert_eq!(items[2]["competition"]["name"], "Spain: LaLiga");
    let kickoff = items[2]["matchTime"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(kickoff).is_ok());

    assert_eq!(upstream.page_calls.load(Ordering::SeqCst), 1);
    assert_eq!(upstream.fixture_calls.load(Ordering::SeqCst), 0);
}
