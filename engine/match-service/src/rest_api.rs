//! REST API endpoints for the match service
//!
//! `GET /api/matches` lists cached fixtures as JSON, `GET /api/matches/csv`
//! downloads them as CSV, `GET /` serves the front-end page and `GET /health`
//! reports cache status.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, warn};
use warp::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

use crate::aggregator::MatchAggregator;
use crate::export::CsvExporter;

/// Download name for CSV exports
pub const CSV_DOWNLOAD_NAME: &str = "upcoming_matches.csv";

/// Front-end page used when no static directory is configured
pub const EMBEDDED_INDEX: &str = include_str!("../static/index.html");

/// Generic JSON error with the given status
fn error_reply(message: &str, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(&serde_json::json!({ "error": message })), status)
        .into_response()
}

/// List upcoming matches, refreshing the cache first if it is stale
pub async fn get_matches(aggregator: Arc<MatchAggregator>) -> Result<Response, warp::Rejection> {
    let matches = aggregator.get_matches().await;

    match serde_json::to_vec(&matches) {
        Ok(body) => Ok(warp::reply::with_header(body, CONTENT_TYPE, "application/json").into_response()),
        Err(e) => {
            error!("Error fetching matches: {}", e);
            Ok(error_reply("Failed to fetch matches", StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

/// Export upcoming matches to CSV and return the file as a download
pub async fn download_matches_csv(
    aggregator: Arc<MatchAggregator>,
    exporter: Arc<CsvExporter>,
) -> Result<Response, warp::Rejection> {
    let matches = aggregator.get_matches().await;

    let export = tokio::task::spawn_blocking(move || exporter.to_csv(&matches)).await;
    let path = match export {
        Ok(Ok(path)) => path,
        Ok(Err(e)) => {
            error!("Error generating CSV: {}", e);
            return Ok(error_reply("Failed to generate CSV", StatusCode::INTERNAL_SERVER_ERROR));
        }
        Err(e) => {
            error!("CSV export task failed: {}", e);
            return Ok(error_reply("Failed to generate CSV", StatusCode::INTERNAL_SERVER_ERROR));
        }
    };

    let body = tokio::fs::read(&path).await;

    // The export only lives as long as the download
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!("Could not remove CSV export {:?}: {}", path, e);
    }

    let body = match body {
        Ok(body) => body,
        Err(e) => {
            error!("Error reading CSV export {:?}: {}", path, e);
            return Ok(error_reply("Failed to generate CSV", StatusCode::INTERNAL_SERVER_ERROR));
        }
    };

    let reply = warp::reply::with_header(body, CONTENT_TYPE, "text/csv; charset=utf-8");
    let reply = warp::reply::with_header(
        reply,
        CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", CSV_DOWNLOAD_NAME),
    );
    Ok(reply.into_response())
}

/// Serve `index.html` from `static_dir`, or the embedded page
pub async fn index(static_dir: Option<Arc<PathBuf>>) -> Result<Response, warp::Rejection> {
    if let Some(dir) = static_dir {
        let path = dir.join("index.html");
        match tokio::fs::read_to_string(&path).await {
            Ok(html) => return Ok(warp::reply::html(html).into_response()),
            Err(e) => warn!("Could not read {:?}, serving embedded page: {}", path, e),
        }
    }

    Ok(warp::reply::html(EMBEDDED_INDEX).into_response())
}

/// Health and cache status
pub async fn health(aggregator: Arc<MatchAggregator>) -> Result<Response, warp::Rejection> {
    let last_refreshed = aggregator.last_refreshed().await.map(|t| t.to_rfc3339());

    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "source": aggregator.source_name(),
        "cached_matches": aggregator.cached_count().await,
        "last_refreshed": last_refreshed,
    }))
    .into_response())
}

/// Create all routes
pub fn create_routes(
    aggregator: Arc<MatchAggregator>,
    exporter: Arc<CsvExporter>,
    static_dir: Option<PathBuf>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let aggregator_filter = warp::any().map(move || aggregator.clone());
    let exporter_filter = warp::any().map(move || exporter.clone());
    let static_dir = static_dir.map(Arc::new);
    let static_filter = warp::any().map(move || static_dir.clone());

    // Match listing endpoint
    let matches = warp::path("api")
        .and(warp::path("matches"))
        .and(warp::path::end())
        .and(warp::get())
        .and(aggregator_filter.clone())
        .and_then(get_matches);

    // CSV download endpoint
    let matches_csv = warp::path("api")
        .and(warp::path("matches"))
        .and(warp::path("csv"))
        .and(warp::path::end())
        .and(warp::get())
        .and(aggregator_filter.clone())
        .and(exporter_filter)
        .and_then(download_matches_csv);

    // Front-end page
    let index_page =
        warp::path::end().and(warp::get()).and(static_filter).and_then(index);

    // Health check endpoint
    let health_check = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(aggregator_filter)
        .and_then(health);

    // Combine all routes
    matches.or(matches_csv).or(index_page).or(health_check).with(
        warp::cors()
            .allow_any_origin()
            .allow_headers(vec!["content-type"])
            .allow_methods(vec!["GET", "OPTIONS"]),
    )
}
