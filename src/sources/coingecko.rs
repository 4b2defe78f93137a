//! CoinGecko market data source.
//!
//! Uses `/coins/markets` for snapshots, `/coins/{id}/market_chart` for
//! history and `/ping` for connectivity checks. Market listings are cached
//! for a short TTL when a cache is attached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{read_body, retry_with_backoff, MarketSource, RetryPolicy, SourceError};
use crate::cache::{cache_key, TtlCache};
use crate::models::{MarketChart, RawMarketEntry};

const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";
const PING_REPLY: &str = "(V3) To the Moon!";

#[derive(Debug, Deserialize)]
struct PingResponse {
    gecko_says: String,
}

pub type MarketCache = TtlCache<Vec<RawMarketEntry>>;

pub struct CoinGeckoMarketSource {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    cache: Option<Arc<MarketCache>>,
    markets_ttl: Duration,
    retry: RetryPolicy,
}

impl CoinGeckoMarketSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: COINGECKO_API_BASE.to_string(),
            api_key: None,
            cache: None,
            markets_ttl: Duration::from_secs(2 * 60),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<SecretString>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Caches market listings in `cache` for `ttl`.
    pub fn with_cache(mut self, cache: Arc<MarketCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.markets_ttl = ttl;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();
        retry_with_backoff(&self.retry, self.name(), || async move {
            let mut request = self
                .client
                .get(url)
                .query(query)
                .header("Accept", "application/json");
            if let Some(key) = &self.api_key {
                request = request.header("x-cg-pro-api-key", key.expose_secret());
            }
            let response = request.send().await?;
            read_body(response).await
        })
        .await
    }

    async fn request_markets(&self, query: &[(&str, String)]) -> Result<Vec<RawMarketEntry>, SourceError> {
        let body = self.get("/coins/markets", query).await?;
        let records: Vec<serde_json::Value> = serde_json::from_str(&body)?;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_value::<RawMarketEntry>(record) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(error = %e, "skipping malformed market entry"),
            }
        }
        debug!(count = entries.len(), "fetched market entries");
        Ok(entries)
    }
}

impl Default for CoinGeckoMarketSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketSource for CoinGeckoMarketSource {
    async fn fetch_markets(
        &self,
        ids: &[String],
        vs_currency: &str,
    ) -> Result<Vec<RawMarketEntry>, SourceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = [
            ("ids", ids.join(",")),
            ("vs_currency", vs_currency.to_lowercase()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", "100".to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];

        match &self.cache {
            Some(cache) => {
                let key = cache_key("coingecko:markets", &query);
                cache
                    .get_or_try_insert_with(&key, self.markets_ttl, || self.request_markets(&query))
                    .await
            }
            None => self.request_markets(&query).await,
        }
    }

    async fn fetch_chart(
        &self,
        id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<MarketChart, SourceError> {
        let path = format!("/coins/{id}/market_chart");
        let query = [
            ("vs_currency", vs_currency.to_lowercase()),
            ("days", days.to_string()),
        ];
        let body = self.get(&path, &query).await?;
        let chart: MarketChart = serde_json::from_str(&body)?;
        debug!(id, points = chart.prices.len(), "fetched market chart");
        Ok(chart)
    }

    async fn ping(&self) -> Result<String, SourceError> {
        let body = self.get("/ping", &[]).await?;
        let reply: PingResponse = serde_json::from_str(&body)?;
        if reply.gecko_says != PING_REPLY {
            return Err(SourceError::Decode(format!(
                "unexpected ping reply {:?}",
                reply.gecko_says
            )));
        }
        Ok(reply.gecko_says)
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}
