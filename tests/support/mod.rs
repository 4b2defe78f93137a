#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use coinfolio::clock::FixedClock;
use coinfolio::models::{MarketChart, RawBalance, RawMarketEntry};
use coinfolio::portfolio::PortfolioService;
use coinfolio::sources::{BalanceSource, MarketSource, SourceError};
use reqwest::StatusCode;

fn upstream_down() -> SourceError {
    SourceError::Status {
        status: StatusCode::BAD_GATEWAY,
        body: "upstream down".to_string(),
    }
}

#[derive(Default)]
pub struct MockBalanceSource {
    balance: Option<RawBalance>,
    pub calls: AtomicUsize,
}

impl MockBalanceSource {
    pub fn ok(balance: RawBalance) -> Self {
        Self {
            balance: Some(balance),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceSource for MockBalanceSource {
    async fn fetch_balance(&self) -> Result<RawBalance, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.balance.clone().ok_or_else(upstream_down)
    }

    async fn ping(&self) -> Result<String, SourceError> {
        match self.balance {
            Some(_) => Ok("balance ok".to_string()),
            None => Err(upstream_down()),
        }
    }

    fn name(&self) -> &str {
        "mock-balance"
    }
}

#[derive(Default)]
pub struct MockMarketSource {
    markets: Option<Vec<RawMarketEntry>>,
    chart: Option<MarketChart>,
    pub calls: AtomicUsize,
}

impl MockMarketSource {
    pub fn ok(markets: Vec<RawMarketEntry>) -> Self {
        Self {
            markets: Some(markets),
            chart: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn with_chart(mut self, chart: MarketChart) -> Self {
        self.chart = Some(chart);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketSource for MockMarketSource {
    async fn fetch_markets(
        &self,
        ids: &[String],
        _vs_currency: &str,
    ) -> Result<Vec<RawMarketEntry>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let markets = self.markets.as_ref().ok_or_else(upstream_down)?;
        Ok(markets
            .iter()
            .filter(|m| ids.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn fetch_chart(
        &self,
        _id: &str,
        _vs_currency: &str,
        _days: u32,
    ) -> Result<MarketChart, SourceError> {
        self.chart.clone().ok_or_else(upstream_down)
    }

    async fn ping(&self) -> Result<String, SourceError> {
        match self.markets {
            Some(_) => Ok("(V3) To the Moon!".to_string()),
            None => Err(upstream_down()),
        }
    }

    fn name(&self) -> &str {
        "mock-market"
    }
}

pub fn bitcoin() -> RawMarketEntry {
    let mut entry =
        RawMarketEntry::new("bitcoin", "btc", "Bitcoin", 2_000_000.0).with_change(100_000.0, 5.2);
    entry.market_cap = Some(39e12);
    entry.market_cap_rank = Some(1);
    entry.total_volume = Some(2.5e12);
    entry.circulating_supply = Some(19_700_000.0);
    entry.total_supply = Some(21_000_000.0);
    entry.max_supply = Some(21_000_000.0);
    entry
}

pub fn ethereum() -> RawMarketEntry {
    let mut entry =
        RawMarketEntry::new("ethereum", "eth", "Ethereum", 117_283.5).with_change(-2_500.0, -2.1);
    entry.market_cap = Some(14e12);
    entry.market_cap_rank = Some(2);
    entry.total_volume = Some(1.2e12);
    entry.circulating_supply = Some(120_000_000.0);
    entry
}

pub fn sample_balance() -> RawBalance {
    RawBalance::new(true)
        .with_holding("jpy", "50000")
        .with_holding("btc", "0.5")
        .with_holding("eth", "2.0")
        .with_holding("xrp", "100")
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 7, 22, 12, 0, 0).unwrap(),
    ))
}

pub fn service(balance: MockBalanceSource, market: MockMarketSource) -> PortfolioService {
    PortfolioService::new(Arc::new(balance), Arc::new(market)).with_clock(fixed_clock())
}
