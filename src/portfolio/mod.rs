//! Portfolio views built from balance and market data.
//!
//! The normalizer, aggregator and detail builder are pure functions;
//! [`PortfolioService`] owns the fetch-and-fallback policy around them.

mod aggregate;
mod detail;
mod error;
pub mod fallback;
mod mapping;
mod normalize;
mod service;

pub use aggregate::summarize;
pub use detail::{build_detail, price_history_from_chart};
pub use error::PortfolioError;
pub use mapping::AssetMapping;
pub use normalize::{normalize, normalize_asset};
pub use service::{FetchOutcome, PortfolioService};
