use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialConfig;
use crate::duration::{deserialize_duration, serialize_duration};
use crate::portfolio::AssetMapping;

/// Default reporting currency.
fn default_reporting_currency() -> String {
    "JPY".to_string()
}

fn default_history_days() -> u32 {
    7
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API server listens on.
    pub bind: String,

    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            cors_origins: Vec::new(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

fn default_rate_limit_requests() -> u32 {
    100
}

fn default_rate_limit_window() -> Duration {
    Duration::from_secs(60 * 60)
}

/// Per-client request quota for the `/api` routes.
///
/// A client may burst up to `requests` calls; one call is replenished every
/// `window / requests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,

    #[serde(default = "default_rate_limit_requests")]
    pub requests: u32,

    #[serde(
        default = "default_rate_limit_window",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: default_rate_limit_requests(),
            window: default_rate_limit_window(),
        }
    }
}

impl RateLimitConfig {
    /// Time to replenish a single request.
    pub fn replenish_interval(&self) -> Duration {
        self.window / self.requests.max(1)
    }

    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        anyhow::ensure!(self.requests > 0, "server.rate_limit.requests must be at least 1");
        anyhow::ensure!(
            !self.replenish_interval().is_zero(),
            "server.rate_limit.window is too short for {} requests",
            self.requests
        );
        Ok(())
    }
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout for upstream calls.
    #[serde(
        default = "default_http_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_http_timeout(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_secs(1)
}

/// Retry policy for transient upstream failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubled on each subsequent retry.
    #[serde(
        default = "default_base_delay",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay: default_base_delay(),
        }
    }
}

fn default_market_ttl() -> Duration {
    Duration::from_secs(2 * 60)
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_purge_interval() -> Duration {
    Duration::from_secs(10 * 60)
}

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long market listings are reused before refetching.
    #[serde(
        default = "default_market_ttl",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub market_ttl: Duration,

    /// TTL for entries inserted without an explicit one.
    #[serde(
        default = "default_cache_ttl",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub default_ttl: Duration,

    /// How often expired entries are swept.
    #[serde(
        default = "default_purge_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub purge_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            market_ttl: default_market_ttl(),
            default_ttl: default_cache_ttl(),
            purge_interval: default_purge_interval(),
        }
    }
}

fn default_balance_base_url() -> String {
    "https://coincheck.com".to_string()
}

/// Exchange balance source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    #[serde(default = "default_balance_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub credentials: CredentialConfig,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            base_url: default_balance_base_url(),
            credentials: CredentialConfig::default(),
        }
    }
}

fn default_market_base_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("COINGECKO_API_KEY".to_string())
}

/// Market data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    #[serde(default = "default_market_base_url")]
    pub base_url: String,

    /// Environment variable holding an optional pro API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: default_market_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Currency all values are priced in (e.g., "JPY").
    #[serde(default = "default_reporting_currency")]
    pub reporting_currency: String,

    /// Days of price history included in asset detail.
    #[serde(default = "default_history_days")]
    pub history_days: u32,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub balance: BalanceConfig,

    #[serde(default)]
    pub market: MarketConfig,

    /// Asset code to market id table. Replaces the built-in table when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<BTreeMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reporting_currency: default_reporting_currency(),
            history_days: default_history_days(),
            server: ServerConfig::default(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            balance: BalanceConfig::default(),
            market: MarketConfig::default(),
            assets: None,
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.reporting_currency.trim().is_empty(),
            "reporting_currency must not be empty"
        );
        anyhow::ensure!(self.history_days > 0, "history_days must be at least 1");
        anyhow::ensure!(!self.http.timeout.is_zero(), "http.timeout must be greater than zero");
        anyhow::ensure!(
            !self.cache.market_ttl.is_zero(),
            "cache.market_ttl must be greater than zero"
        );
        anyhow::ensure!(
            !self.cache.default_ttl.is_zero(),
            "cache.default_ttl must be greater than zero"
        );
        anyhow::ensure!(
            !self.cache.purge_interval.is_zero(),
            "cache.purge_interval must be greater than zero"
        );
        self.server.rate_limit.validate()?;
        if let Some(assets) = &self.assets {
            anyhow::ensure!(!assets.is_empty(), "[assets] must list at least one asset");
        }
        Ok(())
    }
}

/// Loaded configuration with the asset table resolved.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Where the config was loaded from, if a file existed.
    pub config_path: Option<PathBuf>,

    pub reporting_currency: String,
    pub history_days: u32,
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub balance: BalanceConfig,
    pub market: MarketConfig,
    pub assets: AssetMapping,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./coinfolio.toml` if it exists in current directory
/// 2. `~/.local/share/coinfolio/coinfolio.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("coinfolio.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("coinfolio").join("coinfolio.toml");
    }

    local_config
}

impl ResolvedConfig {
    /// Load and resolve config from a file path.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = Config::load(config_path)?;
        Ok(Self::from_config(config, Some(config_path.to_path_buf())))
    }

    /// Load config, falling back to defaults if the file doesn't exist.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            Ok(Self::from_config(Config::default(), None))
        }
    }

    pub fn from_config(config: Config, config_path: Option<PathBuf>) -> Self {
        let assets = match config.assets {
            Some(table) => AssetMapping::from_table(table),
            None => AssetMapping::default(),
        };

        Self {
            config_path,
            reporting_currency: config.reporting_currency,
            history_days: config.history_days,
            server: config.server,
            http: config.http,
            retry: config.retry,
            cache: config.cache,
            balance: config.balance,
            market: config.market,
            assets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.reporting_currency, "JPY");
        assert_eq!(config.history_days, 7);
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.http.timeout, Duration::from_secs(10));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay, Duration::from_secs(1));
        assert_eq!(config.cache.market_ttl, Duration::from_secs(120));
        assert_eq!(config.cache.default_ttl, Duration::from_secs(300));
        assert_eq!(config.cache.purge_interval, Duration::from_secs(600));
        assert_eq!(config.balance.base_url, "https://coincheck.com");
        assert_eq!(config.market.base_url, "https://api.coingecko.com/api/v3");
        assert_eq!(config.market.api_key_env.as_deref(), Some("COINGECKO_API_KEY"));
        assert!(config.server.rate_limit.enabled);
        assert_eq!(config.server.rate_limit.requests, 100);
        assert_eq!(config.server.rate_limit.replenish_interval(), Duration::from_secs(36));
    }

    #[test]
    fn test_load_empty_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("coinfolio.toml");
        std::fs::File::create(&config_path)?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.reporting_currency, "JPY");
        assert!(config.assets.is_none());
        Ok(())
    }

    #[test]
    fn test_load_durations_and_sections() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("coinfolio.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "reporting_currency = \"USD\"")?;
        writeln!(file, "history_days = 30")?;
        writeln!(file, "[retry]")?;
        writeln!(file, "max_retries = 5")?;
        writeln!(file, "base_delay = \"250ms\"")?;
        writeln!(file, "[cache]")?;
        writeln!(file, "market_ttl = \"30s\"")?;
        writeln!(file, "[server]")?;
        writeln!(file, "cors_origins = [\"http://localhost:5173\"]")?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.reporting_currency, "USD");
        assert_eq!(config.history_days, 30);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(250));
        assert_eq!(config.cache.market_ttl, Duration::from_secs(30));
        assert_eq!(config.cache.default_ttl, Duration::from_secs(300));
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        Ok(())
    }

    #[test]
    fn test_invalid_duration_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("coinfolio.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[http]")?;
        writeln!(file, "timeout = \"soon\"")?;

        assert!(Config::load(&config_path).is_err());
        Ok(())
    }

    #[test]
    fn test_zero_history_days_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("coinfolio.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "history_days = 0")?;

        let err = Config::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("history_days"));
        Ok(())
    }

    #[test]
    fn test_zero_cache_durations_are_rejected() -> Result<()> {
        let dir = TempDir::new()?;

        for (key, value) in [("purge_interval", "0s"), ("market_ttl", "0ms"), ("default_ttl", "0m")] {
            let config_path = dir.path().join(format!("{key}.toml"));
            let mut file = std::fs::File::create(&config_path)?;
            writeln!(file, "[cache]")?;
            writeln!(file, "{key} = \"{value}\"")?;

            let err = Config::load(&config_path).unwrap_err();
            assert!(err.to_string().contains(key), "{key}: {err}");
        }
        Ok(())
    }

    #[test]
    fn test_rate_limit_section() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("coinfolio.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[server.rate_limit]")?;
        writeln!(file, "requests = 10")?;
        writeln!(file, "window = \"1m\"")?;

        let config = Config::load(&config_path)?;
        assert!(config.server.rate_limit.enabled);
        assert_eq!(config.server.rate_limit.replenish_interval(), Duration::from_secs(6));

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[server.rate_limit]")?;
        writeln!(file, "requests = 0")?;
        let err = Config::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("rate_limit.requests"));

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[server.rate_limit]")?;
        writeln!(file, "enabled = false")?;
        writeln!(file, "requests = 0")?;
        assert!(!Config::load(&config_path)?.server.rate_limit.enabled);
        Ok(())
    }

    #[test]
    fn test_zero_http_timeout_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("coinfolio.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[http]")?;
        writeln!(file, "timeout = \"0s\"")?;

        let err = Config::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("http.timeout"));
        Ok(())
    }

    #[test]
    fn test_assets_table_replaces_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("coinfolio.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[assets]")?;
        writeln!(file, "BTC = \"bitcoin\"")?;
        writeln!(file, "sol = \"solana\"")?;

        let resolved = ResolvedConfig::load(&config_path)?;
        assert_eq!(resolved.assets.market_id("sol"), Some("solana"));
        assert_eq!(resolved.assets.market_id("btc"), Some("bitcoin"));
        assert_eq!(resolved.assets.market_id("eth"), None);
        assert_eq!(resolved.config_path.as_deref(), Some(config_path.as_path()));
        Ok(())
    }

    #[test]
    fn test_resolved_config_load_or_default_missing_file() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("coinfolio.toml");

        let resolved = ResolvedConfig::load_or_default(&config_path)?;
        assert!(resolved.config_path.is_none());
        assert_eq!(resolved.reporting_currency, "JPY");
        assert_eq!(resolved.assets.market_id("eth"), Some("ethereum"));
        Ok(())
    }

    #[test]
    fn test_serialized_config_round_trips_durations() -> Result<()> {
        let rendered = toml::to_string(&Config::default())?;
        assert!(rendered.contains("market_ttl = \"2m\""));
        assert!(rendered.contains("timeout = \"10s\""));

        let parsed: Config = toml::from_str(&rendered)?;
        assert_eq!(parsed.cache.purge_interval, Duration::from_secs(600));
        Ok(())
    }
}
