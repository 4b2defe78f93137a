use std::sync::Arc;

use tracing::{error, info, warn};

use super::{build_detail, fallback, normalize, price_history_from_chart, summarize, AssetMapping, PortfolioError};
use crate::clock::{Clock, SystemClock};
use crate::models::{
    AssetDetail, CheckStatus, ConnectionCheck, ConnectionReport, NormalizedAsset, PortfolioSummary,
    RawBalance, RawMarketEntry, Sourced,
};
use crate::sources::{BalanceSource, MarketSource, SourceError};

/// How the two upstream fetches of one request turned out.
#[derive(Debug)]
pub enum FetchOutcome {
    BothFailed,
    /// Prices are known but holdings are not.
    BalanceFailedOnly(Vec<RawMarketEntry>),
    /// Without prices nothing can be valued.
    MarketFailedOnly,
    BothSucceeded(RawBalance, Vec<RawMarketEntry>),
}

impl FetchOutcome {
    /// Classifies a pair of results. A market response with no entries counts
    /// as a market failure.
    pub fn classify(
        balance: Result<RawBalance, SourceError>,
        markets: Result<Vec<RawMarketEntry>, SourceError>,
    ) -> Self {
        let markets = markets.ok().filter(|m| !m.is_empty());
        match (balance.ok(), markets) {
            (None, None) => FetchOutcome::BothFailed,
            (None, Some(markets)) => FetchOutcome::BalanceFailedOnly(markets),
            (Some(_), None) => FetchOutcome::MarketFailedOnly,
            (Some(balance), Some(markets)) => FetchOutcome::BothSucceeded(balance, markets),
        }
    }

    pub fn uses_fallback(&self) -> bool {
        matches!(self, FetchOutcome::BothFailed | FetchOutcome::MarketFailedOnly)
    }
}

/// Serves portfolio views from a balance source and a market source.
pub struct PortfolioService {
    balance: Arc<dyn BalanceSource>,
    market: Arc<dyn MarketSource>,
    mapping: AssetMapping,
    reporting_currency: String,
    history_days: u32,
    clock: Arc<dyn Clock>,
}

impl PortfolioService {
    pub fn new(balance: Arc<dyn BalanceSource>, market: Arc<dyn MarketSource>) -> Self {
        Self {
            balance,
            market,
            mapping: AssetMapping::default(),
            reporting_currency: "JPY".to_string(),
            history_days: 7,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_mapping(mut self, mapping: AssetMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_reporting_currency(mut self, currency: impl Into<String>) -> Self {
        self.reporting_currency = currency.into().trim().to_uppercase();
        self
    }

    pub fn with_history_days(mut self, days: u32) -> Self {
        self.history_days = days.max(1);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn mapping(&self) -> &AssetMapping {
        &self.mapping
    }

    pub fn reporting_currency(&self) -> &str {
        &self.reporting_currency
    }

    fn vs_currency(&self) -> String {
        self.reporting_currency.to_lowercase()
    }

    fn log_failure(&self, source: &str, result: &Result<impl Sized, SourceError>) {
        if let Err(e) = result {
            error!(source, error = %e, "upstream fetch failed");
        }
    }

    /// Fetches the balance and all mapped markets concurrently.
    async fn fetch_all(&self) -> FetchOutcome {
        let ids = self.mapping.market_ids();
        let vs_currency = self.vs_currency();
        let (balance, markets) = tokio::join!(
            self.balance.fetch_balance(),
            self.market.fetch_markets(&ids, &vs_currency)
        );
        self.log_failure(self.balance.name(), &balance);
        self.log_failure(self.market.name(), &markets);

        let outcome = FetchOutcome::classify(balance, markets);
        if outcome.uses_fallback() {
            warn!(?outcome, "market data unavailable, serving fallback data");
        }
        outcome
    }

    fn normalize_outcome(&self, outcome: FetchOutcome) -> Sourced<Vec<NormalizedAsset>> {
        let currency = &self.reporting_currency;
        match outcome {
            FetchOutcome::BothFailed | FetchOutcome::MarketFailedOnly => Sourced::Fallback(fallback::assets()),
            FetchOutcome::BalanceFailedOnly(markets) => {
                Sourced::Live(normalize(None, &markets, &self.mapping, currency))
            }
            FetchOutcome::BothSucceeded(balance, markets) => {
                Sourced::Live(normalize(Some(&balance), &markets, &self.mapping, currency))
            }
        }
    }

    /// Portfolio totals and per-asset shares.
    pub async fn summary(&self) -> Sourced<PortfolioSummary> {
        let now = self.clock.now();
        match self.normalize_outcome(self.fetch_all().await) {
            Sourced::Live(assets) => {
                let summary = summarize(&assets, now);
                info!(assets = summary.assets.len(), total_value = summary.total_value, "built portfolio summary");
                Sourced::Live(summary)
            }
            Sourced::Fallback(_) => Sourced::Fallback(fallback::summary(now)),
        }
    }

    /// Held assets with their current value.
    pub async fn assets(&self) -> Sourced<Vec<NormalizedAsset>> {
        let assets = self.normalize_outcome(self.fetch_all().await);
        info!(assets = assets.value().len(), fallback = assets.is_fallback(), "built asset list");
        assets
    }

    /// Detail view for one asset code, including price history.
    pub async fn asset_detail(&self, code: &str) -> Result<Sourced<AssetDetail>, PortfolioError> {
        let code = code.trim().to_lowercase();
        let Some(market_id) = self.mapping.market_id(&code) else {
            return Err(PortfolioError::UnsupportedAsset(code));
        };

        let ids = [market_id.to_string()];
        let vs_currency = self.vs_currency();
        let (balance, markets, chart) = tokio::join!(
            self.balance.fetch_balance(),
            self.market.fetch_markets(&ids, &vs_currency),
            self.market.fetch_chart(market_id, &vs_currency, self.history_days)
        );
        self.log_failure(self.balance.name(), &balance);
        self.log_failure(self.market.name(), &markets);

        let markets = match markets {
            Ok(markets) => markets,
            Err(_) => {
                warn!(code = %code, "market data unavailable, serving fallback detail");
                return Ok(Sourced::Fallback(fallback::detail(&code)));
            }
        };
        let Some(entry) = markets.iter().find(|m| m.id == market_id) else {
            return Err(PortfolioError::AssetNotFound(code));
        };

        let amount = balance
            .ok()
            .and_then(|b| b.amount_of(&code).and_then(|a| a.trim().parse::<f64>().ok()))
            .filter(|a| a.is_finite() && *a > 0.0)
            .unwrap_or(0.0);

        let history = match chart {
            Ok(chart) => price_history_from_chart(&chart),
            Err(e) => {
                warn!(code = %code, error = %e, "price history unavailable");
                Vec::new()
            }
        };

        Ok(Sourced::Live(build_detail(entry, &code, amount, history)))
    }

    /// Probes both upstream services concurrently.
    pub async fn check_connections(&self) -> ConnectionReport {
        let (balance, market) = tokio::join!(self.balance.ping(), self.market.ping());
        let now = self.clock.now();

        let check = |service: &str, result: Result<String, SourceError>| match result {
            Ok(message) => ConnectionCheck {
                service: service.to_string(),
                status: CheckStatus::Success,
                message,
                timestamp: now,
            },
            Err(e) => {
                error!(source = service, error = %e, "connection check failed");
                ConnectionCheck {
                    service: service.to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                    timestamp: now,
                }
            }
        };

        let report = ConnectionReport::from_checks(vec![
            check(self.balance.name(), balance),
            check(self.market.name(), market),
        ]);
        info!(overall = ?report.overall, "checked upstream connections");
        report
    }
}
