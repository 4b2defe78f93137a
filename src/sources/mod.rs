//! Upstream data sources: the exchange balance API and the market data API.

pub mod coincheck;
pub mod coingecko;
pub mod retry;

pub use coincheck::CoincheckBalanceSource;
pub use coingecko::CoinGeckoMarketSource;
pub use retry::{retry_with_backoff, RetryPolicy};

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::models::{MarketChart, RawBalance, RawMarketEntry};

/// Failure talking to an upstream service.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("authentication rejected ({0})")]
    Auth(StatusCode),

    #[error("rate limited by upstream")]
    RateLimited,

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("upstream rejected the request: {0}")]
    Rejected(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl SourceError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Transport(_) | SourceError::RateLimited => true,
            SourceError::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// Maps a non-success response to the matching variant.
    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::Auth(status),
            StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited,
            _ => SourceError::Status { status, body },
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(err.to_string())
    }
}

/// Supplies the account's raw per-currency holdings.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn fetch_balance(&self) -> Result<RawBalance, SourceError>;

    /// Checks the service is reachable. Returns a short status message.
    async fn ping(&self) -> Result<String, SourceError>;

    fn name(&self) -> &str;
}

/// Supplies market snapshots and price charts.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Snapshots for the given market ids, priced in `vs_currency`.
    async fn fetch_markets(
        &self,
        ids: &[String],
        vs_currency: &str,
    ) -> Result<Vec<RawMarketEntry>, SourceError>;

    /// Price, market cap and volume series for one market id over `days`.
    async fn fetch_chart(
        &self,
        id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<MarketChart, SourceError>;

    /// Checks the service is reachable. Returns a short status message.
    async fn ping(&self) -> Result<String, SourceError>;

    fn name(&self) -> &str;
}

/// Reads a response, turning non-success statuses into errors.
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, SourceError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(SourceError::from_status(status, body));
    }
    Ok(body)
}
