mod asset;
mod balance;
mod connection;
mod market;
mod portfolio;
mod sourced;

pub use asset::{AssetDetail, HighLow, NormalizedAsset, PriceHistoryPoint, Supply};
pub use balance::RawBalance;
pub use connection::{CheckStatus, ConnectionCheck, ConnectionReport, OverallStatus};
pub use market::{MarketChart, RawMarketEntry};
pub use portfolio::{AssetSummary, PortfolioSummary};
pub use sourced::Sourced;
