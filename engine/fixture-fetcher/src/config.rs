use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FetchError;

/// Longest pause a delay bound may ask for, in seconds
pub const MAX_DELAY_SECS: f64 = 3600.0;

/// Widest fixtures window, in days
pub const MAX_WINDOW_DAYS: i64 = 30;

/// Configuration for the fixture fetchers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Use the remote API; when false the HTML scraper is used instead
    pub use_api: bool,

    /// Remote API configuration
    pub api: ApiConfig,

    /// HTML scraper configuration
    pub scraper: ScraperConfig,

    /// Outbound HTTP client configuration
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, e.g. "https://api.football-data.org/v4"
    pub base_url: String,

    /// Value of the `X-Auth-Token` header
    pub api_key: String,

    /// Days after today covered by the fixtures window
    pub window_days: i64,

    /// Pause before each team-history request
    pub delay: DelayBounds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Fixtures page URL
    pub url: String,

    /// Pause before each team-details lookup
    pub delay: DelayBounds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent pool rotated per request
    pub user_agents: Vec<String>,

    /// Route requests through a randomly chosen proxy
    pub use_proxies: bool,

    /// Proxy URLs used when `use_proxies` is set
    pub proxies: Vec<String>,
}

/// Inclusive bounds for a randomized pause, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayBounds {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayBounds {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// No pause at all
    pub fn none() -> Self {
        Self { min_secs: 0.0, max_secs: 0.0 }
    }

    /// Both bounds finite, `0 <= min <= max <= MAX_DELAY_SECS`
    pub fn validate(&self) -> Result<(), FetchError> {
        let finite = self.min_secs.is_finite() && self.max_secs.is_finite();
        if !(finite
            && self.min_secs >= 0.0
            && self.max_secs >= self.min_secs
            && self.max_secs <= MAX_DELAY_SECS)
        {
            return Err(FetchError::Config(format!(
                "invalid delay bounds {}..{}",
                self.min_secs, self.max_secs
            )));
        }
        Ok(())
    }
}

pub const DEFAULT_API_BASE_URL: &str = "https://api.football-data.org/v4";
pub const DEFAULT_SCRAPE_URL: &str = "https://m.flashscore.co.ke";

/// Browser User-Agent strings rotated across requests
pub const DEFAULT_USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.212 Safari/537.36",
];

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            use_api: true,
            api: ApiConfig::default(),
            scraper: ScraperConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            window_days: 2,
            delay: DelayBounds::new(1.0, 3.0),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self { url: DEFAULT_SCRAPE_URL.to_string(), delay: DelayBounds::new(1.0, 5.0) }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            use_proxies: false,
            proxies: Vec::new(),
        }
    }
}

impl FetcherConfig {
    /// Override fields with environment variables if present
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("USE_API") {
            self.use_api = parse_flag(&value);
        }

        if let Ok(api_key) = std::env::var("FOOTBALL_API_KEY") {
            self.api.api_key = api_key;
        }

        if let Ok(base_url) = std::env::var("FOOTBALL_API_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(url) = std::env::var("SCRAPE_URL") {
            self.scraper.url = url;
        }

        if let Some(min) = env_parsed("RANDOM_DELAY_MIN") {
            self.api.delay.min_secs = min;
        }

        if let Some(max) = env_parsed("RANDOM_DELAY_MAX") {
            self.api.delay.max_secs = max;
        }

        if let Some(min) = env_parsed("SCRAPE_DELAY_MIN") {
            self.scraper.delay.min_secs = min;
        }

        if let Some(max) = env_parsed("SCRAPE_DELAY_MAX") {
            self.scraper.delay.max_secs = max;
        }

        if let Some(timeout) = env_parsed("HTTP_TIMEOUT_SECS") {
            self.http.timeout_secs = timeout;
        }

        if let Ok(value) = std::env::var("USE_PROXIES") {
            self.http.use_proxies = parse_flag(&value);
        }

        if let Ok(proxies) = std::env::var("PROXY_URLS") {
            self.http.proxies = proxies
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        self.api.delay.validate()?;
        self.scraper.delay.validate()?;

        if self.http.timeout_secs == 0 {
            return Err(FetchError::Config("HTTP timeout must be at least one second".to_string()));
        }

        if self.http.user_agents.is_empty() {
            return Err(FetchError::Config("user agent pool is empty".to_string()));
        }

        if !(0..=MAX_WINDOW_DAYS).contains(&self.api.window_days) {
            return Err(FetchError::Config(format!(
                "fixtures window must be 0..={} days: {}",
                MAX_WINDOW_DAYS, self.api.window_days
            )));
        }

        Ok(())
    }

    /// Zero delays everywhere; used by tests and local runs
    pub fn without_delays(mut self) -> Self {
        self.api.delay = DelayBounds::none();
        self.scraper.delay = DelayBounds::none();
        self
    }
}

/// Case-insensitive "true", "1", "yes" or "on"; everything else is false
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

/// Parsed value of `name`; unset gives `None`, unparseable logs a warning
/// and gives `None` so the current value stays
pub fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}
