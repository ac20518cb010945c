//! Service configuration management
//!
//! Defaults, then an optional TOML file, then environment variables. The
//! environment names are the ones the service has always used (`USE_API`,
//! `PORT`, `TEMP_FOLDER`, ...), so existing deployments keep working.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fixture_fetcher::config::{env_parsed, parse_flag};
use fixture_fetcher::FetcherConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Environment variable naming the optional config file
pub const CONFIG_PATH_ENV: &str = "MATCHDAY_CONFIG";

/// Config file read when `MATCHDAY_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "matchday.toml";

/// Longest accepted cache lifetime: one week
pub const MAX_STALE_AFTER_SECS: u64 = 7 * 24 * 3600;

/// Longest accepted background refresh interval: thirty days
pub const MAX_REFRESH_INTERVAL_HOURS: u64 = 30 * 24;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Verbose logging and development behaviour
    pub debug: bool,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Fixture source configuration
    pub fetcher: FetcherConfig,

    /// Cache and refresh policy
    pub cache: CacheConfig,

    /// Background refresh configuration
    pub scheduler: SchedulerConfig,

    /// CSV export configuration
    pub export: ExportConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Directory holding `index.html`; the embedded page is served when unset
    pub static_dir: Option<PathBuf>,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Age in seconds at which cached fixtures are refreshed before serving
    pub stale_after_secs: u64,

    /// Keep the last good fixtures when a refresh fails
    pub keep_previous_on_failure: bool,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run the periodic background refresh
    pub enabled: bool,

    /// Hours between background refreshes
    pub refresh_interval_hours: u64,

    /// Fetch once before the server starts accepting requests
    pub refresh_on_startup: bool,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for generated CSV files
    pub temp_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 5000, static_dir: None }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { stale_after_secs: 3600, keep_previous_on_failure: true }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: true, refresh_interval_hours: 24, refresh_on_startup: true }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { temp_dir: std::env::temp_dir() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

impl CacheConfig {
    /// Cache lifetime, capped at [`MAX_STALE_AFTER_SECS`]
    pub fn stale_after(&self) -> chrono::Duration {
        i64::try_from(self.stale_after_secs.min(MAX_STALE_AFTER_SECS))
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| chrono::Duration::hours(1))
    }
}

impl ServiceConfig {
    /// Get the server address
    pub fn server_addr(&self) -> ServiceResult<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ServiceError::Config(format!("invalid server address: {}", e)))
    }

    /// Background refresh period, capped at [`MAX_REFRESH_INTERVAL_HOURS`]
    pub fn refresh_interval(&self) -> Duration {
        let hours = self.scheduler.refresh_interval_hours.min(MAX_REFRESH_INTERVAL_HOURS);
        Duration::from_secs(hours * 3600)
    }

    /// Level actually used: `debug` forces at least debug output
    pub fn effective_log_level(&self) -> &str {
        if self.debug && matches!(self.logging.level.as_str(), "info" | "warn" | "error") {
            "debug"
        } else {
            &self.logging.level
        }
    }
}

/// Load configuration from `.env`, the config file and environment variables
pub fn load_config() -> ServiceResult<ServiceConfig> {
    dotenv::dotenv().ok();

    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = load_from_file(Path::new(&path))?;

    load_from_env(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from a TOML file; a missing file yields the defaults
pub fn load_from_file(path: &Path) -> ServiceResult<ServiceConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Toml).required(false))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Override configuration with environment variables
pub fn load_from_env(config: &mut ServiceConfig) {
    if let Ok(debug) = std::env::var("DEBUG") {
        config.debug = parse_flag(&debug);
    }

    if let Ok(host) = std::env::var("HOST") {
        config.server.host = host;
    }

    if let Some(port) = env_parsed("PORT") {
        config.server.port = port;
    }

    if let Ok(static_dir) = std::env::var("STATIC_DIR") {
        config.server.static_dir = Some(PathBuf::from(static_dir));
    }

    if let Ok(temp_dir) = std::env::var("TEMP_FOLDER") {
        config.export.temp_dir = PathBuf::from(temp_dir);
    }

    if let Some(stale) = env_parsed("STALE_AFTER_SECS") {
        config.cache.stale_after_secs = stale;
    }

    if let Ok(keep) = std::env::var("KEEP_CACHE_ON_FAILURE") {
        config.cache.keep_previous_on_failure = parse_flag(&keep);
    }

    if let Some(hours) = env_parsed("REFRESH_INTERVAL_HOURS") {
        config.scheduler.refresh_interval_hours = hours;
    }

    if let Ok(level) = std::env::var("LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Ok(format) = std::env::var("LOG_FORMAT") {
        config.logging.format = format;
    }

    config.fetcher.apply_env();
}

/// Validate configuration
pub fn validate_config(config: &ServiceConfig) -> ServiceResult<()> {
    config.fetcher.validate()?;

    if config.server.port == 0 {
        return Err(ServiceError::Config(format!("Invalid port: {}", config.server.port)));
    }

    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(ServiceError::Config(format!("Invalid log level: {}", config.logging.level))),
    }

    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => {
            return Err(ServiceError::Config(format!(
                "Invalid log format: {}",
                config.logging.format
            )))
        }
    }

    if !(1..=MAX_STALE_AFTER_SECS).contains(&config.cache.stale_after_secs) {
        return Err(ServiceError::Config(format!(
            "stale_after_secs must be 1..={}: {}",
            MAX_STALE_AFTER_SECS, config.cache.stale_after_secs
        )));
    }

    if config.scheduler.enabled
        && !(1..=MAX_REFRESH_INTERVAL_HOURS).contains(&config.scheduler.refresh_interval_hours)
    {
        return Err(ServiceError::Config(format!(
            "refresh interval must be 1..={} hours: {}",
            MAX_REFRESH_INTERVAL_HOURS, config.scheduler.refresh_interval_hours
        )));
    }

    if !config.export.temp_dir.exists() {
        std::fs::create_dir_all(&config.export.temp_dir)?;
    }

    Ok(())
}
