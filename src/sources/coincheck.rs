//! Coincheck exchange balance source.
//!
//! Private endpoints are signed with HMAC-SHA256 over `nonce + url + body`,
//! hex encoded, and sent with the `ACCESS-KEY`, `ACCESS-NONCE` and
//! `ACCESS-SIGNATURE` headers. The nonce is the clock's Unix time in
//! milliseconds.

use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

use super::{read_body, retry_with_backoff, BalanceSource, RetryPolicy, SourceError};
use crate::clock::{Clock, SystemClock};
use crate::credentials::ApiCredentials;
use crate::models::RawBalance;

const COINCHECK_API_BASE: &str = "https://coincheck.com";
const BALANCE_PATH: &str = "/api/accounts/balance";
const RATE_PATH: &str = "/api/exchange/orders/rate";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct RateResponse {
    rate: String,
}

pub struct CoincheckBalanceSource {
    client: Client,
    base_url: String,
    credentials: Option<ApiCredentials>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl CoincheckBalanceSource {
    pub fn new(credentials: Option<ApiCredentials>) -> Self {
        Self {
            client: Client::new(),
            base_url: COINCHECK_API_BASE.to_string(),
            credentials,
            clock: Arc::new(SystemClock),
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

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Current exchange rate for a trading pair such as `btc_jpy`.
    pub async fn fetch_rate(&self, pair: &str) -> Result<f64, SourceError> {
        let url = format!("{}{}", self.base_url, RATE_PATH);
        let url = url.as_str();
        let body = retry_with_backoff(&self.retry, self.name(), || async move {
            let response = self
                .client
                .get(url)
                .query(&[("pair", pair)])
                .header("Accept", "application/json")
                .send()
                .await?;
            read_body(response).await
        })
        .await?;

        let parsed: RateResponse = serde_json::from_str(&body)?;
        parsed
            .rate
            .trim()
            .parse()
            .map_err(|_| SourceError::Decode(format!("invalid rate {:?}", parsed.rate)))
    }

    async fn signed_get(&self, credentials: &ApiCredentials, path: &str) -> Result<String, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        let nonce = self.clock.now_millis().to_string();
        let signature = sign(credentials.secret.expose_secret(), &nonce, &url, "")?;

        let response = self
            .client
            .get(&url)
            .header("ACCESS-KEY", &credentials.key)
            .header("ACCESS-NONCE", &nonce)
            .header("ACCESS-SIGNATURE", signature)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        read_body(response).await
    }
}

/// Hex-encoded HMAC-SHA256 of `nonce + url + body`.
pub fn sign(secret: &str, nonce: &str, url: &str, body: &str) -> Result<String, SourceError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SourceError::Rejected(format!("invalid signing secret: {e}")))?;
    mac.update(nonce.as_bytes());
    mac.update(url.as_bytes());
    mac.update(body.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl BalanceSource for CoincheckBalanceSource {
    async fn fetch_balance(&self) -> Result<RawBalance, SourceError> {
        let Some(credentials) = &self.credentials else {
            return Err(SourceError::NotConfigured("coincheck credentials"));
        };

        let body = retry_with_backoff(&self.retry, self.name(), || {
            self.signed_get(credentials, BALANCE_PATH)
        })
        .await?;

        let balance: RawBalance = serde_json::from_str(&body)?;
        if !balance.success {
            return Err(SourceError::Rejected(
                "balance response reported success=false".to_string(),
            ));
        }

        debug!(holdings = balance.holdings.len(), "fetched coincheck balance");
        Ok(balance)
    }

    async fn ping(&self) -> Result<String, SourceError> {
        let rate = self.fetch_rate("btc_jpy").await?;
        Ok(format!("BTC/JPY rate: {rate}"))
    }

    fn name(&self) -> &str {
        "coincheck"
    }
}
