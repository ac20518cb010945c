//! Request disguise: rotating headers, randomized pauses and optional proxies
//!
//! Both fetchers talk to third parties that throttle or block obvious bots.
//! Every request gets a User-Agent drawn from the configured pool, and the
//! fetchers pause for a random interval between consecutive lookups.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL,
    CONNECTION, DNT, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use reqwest::{Client, Proxy};
use tracing::debug;

use crate::config::{DelayBounds, HttpConfig, DEFAULT_USER_AGENTS};
use crate::error::{FetchError, FetchResult};

/// Auth header expected by football-data.org
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Builds randomized header sets from a User-Agent pool
#[derive(Debug, Clone)]
pub struct RequestDisguise {
    user_agents: Vec<String>,
}

impl RequestDisguise {
    pub fn new(user_agents: Vec<String>) -> Self {
        Self { user_agents }
    }

    pub fn from_config(http: &HttpConfig) -> Self {
        Self::new(http.user_agents.clone())
    }

    /// Pick a User-Agent from the pool
    pub fn user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENTS[0])
    }

    /// Headers for JSON API calls
    pub fn api_headers(&self, api_key: &str) -> FetchResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-auth-token"),
            header_value(api_key, AUTH_TOKEN_HEADER)?,
        );
        headers.insert(USER_AGENT, header_value(self.user_agent(), "User-Agent")?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        Ok(headers)
    }

    /// Headers that look like a regular browser page load
    pub fn browser_headers(&self) -> FetchResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(self.user_agent(), "User-Agent")?);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, br"));
        headers.insert(DNT, HeaderValue::from_static("1"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        Ok(headers)
    }
}

fn header_value(value: &str, name: &str) -> FetchResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| FetchError::Config(format!("invalid {} header value: {}", name, e)))
}

/// Draw a pause length within `bounds`.
///
/// Bounds that fail [`DelayBounds::validate`] mean no pause.
pub fn sample_delay(bounds: DelayBounds) -> Duration {
    if bounds.validate().is_err() || bounds.max_secs <= 0.0 {
        return Duration::ZERO;
    }
    let secs = if bounds.max_secs <= bounds.min_secs {
        bounds.min_secs
    } else {
        rand::thread_rng().gen_range(bounds.min_secs..=bounds.max_secs)
    };
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

/// Sleep for a random interval within `bounds`
pub async fn random_delay(bounds: DelayBounds) {
    let delay = sample_delay(bounds);
    if delay.is_zero() {
        return;
    }
    debug!("Pausing {:?} before next request", delay);
    tokio::time::sleep(delay).await;
}

/// Build an HTTP client with the configured timeout and, when enabled, a
/// randomly chosen proxy from the pool.
pub fn build_client(http: &HttpConfig) -> FetchResult<Client> {
    let mut builder = Client::builder().timeout(Duration::from_secs(http.timeout_secs));

    if http.use_proxies {
        if let Some(proxy_url) = http.proxies.choose(&mut rand::thread_rng()) {
            debug!("Routing requests through proxy {}", proxy_url);
            let proxy = Proxy::all(proxy_url.as_str())
                .map_err(|e| FetchError::Config(format!("invalid proxy {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }
    }

    builder.build().map_err(FetchError::Transport)
}
