//! Process-wide resources with an explicit lifecycle.
//!
//! [`AppContext::from_config`] builds the HTTP client, the market cache, both
//! sources and the portfolio service. [`AppContext::start_maintenance`] starts
//! the cache purge task and [`AppContext::shutdown`] stops it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::config::ResolvedConfig;
use crate::credentials::ApiCredentials;
use crate::portfolio::PortfolioService;
use crate::sources::coingecko::MarketCache;
use crate::sources::{BalanceSource, CoinGeckoMarketSource, CoincheckBalanceSource, MarketSource, RetryPolicy};

pub struct AppContext {
    service: Arc<PortfolioService>,
    market_cache: Arc<MarketCache>,
    purge_interval: Duration,
    purge_task: Mutex<Option<JoinHandle<()>>>,
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("coinfolio/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

impl AppContext {
    /// Builds every collaborator from configuration.
    pub async fn from_config(config: &ResolvedConfig) -> Result<Self> {
        Self::from_config_with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn from_config_with_clock(config: &ResolvedConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let client = build_http_client(config.http.timeout)?;
        let retry = RetryPolicy::from(&config.retry);

        let store = config.balance.credentials.build();
        let credentials = ApiCredentials::load(store.as_ref())
            .await
            .context("Failed to load exchange credentials")?;
        if credentials.is_none() {
            warn!(
                backend = %config.balance.credentials.describe(),
                "exchange credentials not configured, balances will be unavailable"
            );
        }

        let balance: Arc<dyn BalanceSource> = Arc::new(
            CoincheckBalanceSource::new(credentials)
                .with_client(client.clone())
                .with_base_url(&config.balance.base_url)
                .with_clock(clock.clone())
                .with_retry(retry),
        );

        let market_cache: Arc<MarketCache> =
            Arc::new(TtlCache::new(config.cache.default_ttl).with_clock(clock.clone()));
        let api_key = config
            .market
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);
        let market: Arc<dyn MarketSource> = Arc::new(
            CoinGeckoMarketSource::new()
                .with_client(client)
                .with_base_url(&config.market.base_url)
                .with_api_key(api_key)
                .with_cache(market_cache.clone(), config.cache.market_ttl)
                .with_retry(retry),
        );

        let service = PortfolioService::new(balance, market)
            .with_mapping(config.assets.clone())
            .with_reporting_currency(&config.reporting_currency)
            .with_history_days(config.history_days)
            .with_clock(clock);

        info!(
            currency = %config.reporting_currency,
            assets = config.assets.len(),
            "application context ready"
        );

        Ok(Self {
            service: Arc::new(service),
            market_cache,
            purge_interval: config.cache.purge_interval,
            purge_task: Mutex::new(None),
        })
    }

    pub fn service(&self) -> Arc<PortfolioService> {
        Arc::clone(&self.service)
    }

    pub fn market_cache(&self) -> &Arc<MarketCache> {
        &self.market_cache
    }

    /// Starts the periodic cache purge. Calling it again is a no-op.
    pub fn start_maintenance(&self) {
        let mut task = self.purge_task.lock().unwrap_or_else(|e| e.into_inner());
        if task.is_none() {
            *task = Some(self.market_cache.spawn_purge_task(self.purge_interval));
        }
    }

    pub fn is_maintenance_running(&self) -> bool {
        self.purge_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    /// Stops background work and drops cached responses.
    pub fn shutdown(&self) {
        if let Some(task) = self.purge_task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            task.abort();
        }
        self.market_cache.clear();
        info!("application context shut down");
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        if let Some(task) = self.purge_task.get_mut().ok().and_then(Option::take) {
            task.abort();
        }
    }
}
