//! Placeholder data shown when live market data is unavailable.
//!
//! These figures are illustrative only. Callers receive them wrapped in
//! [`Sourced::Fallback`](crate::models::Sourced) and must not present them as
//! the account's holdings.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{AssetDetail, AssetSummary, NormalizedAsset, PortfolioSummary, PriceHistoryPoint, Supply};

struct Fixture {
    code: &'static str,
    name: &'static str,
    amount: f64,
    price: f64,
    value: f64,
    change_24h: f64,
    change_percent_24h: f64,
}

fn placeholder_asset(f: &Fixture) -> NormalizedAsset {
    NormalizedAsset {
        id: f.code.to_string(),
        name: f.name.to_string(),
        symbol: f.code.to_uppercase(),
        amount: f.amount,
        value: f.value,
        current_price: f.price,
        change_24h: Some(f.change_24h),
        change_percent_24h: Some(f.change_percent_24h),
    }
}

/// Placeholder portfolio summary.
pub fn summary(now: DateTime<Utc>) -> PortfolioSummary {
    let entries = [
        (
            Fixture {
                code: "btc",
                name: "Bitcoin",
                amount: 0.5,
                price: 2_000_000.0,
                value: 1_000_000.0,
                change_24h: 100_000.0,
                change_percent_24h: 5.2,
            },
            0.6,
        ),
        (
            Fixture {
                code: "eth",
                name: "Ethereum",
                amount: 2.0,
                price: 333_333.5,
                value: 666_667.0,
                change_24h: -5_000.0,
                change_percent_24h: -2.1,
            },
            0.4,
        ),
    ];

    let assets = entries
        .iter()
        .map(|(f, ratio)| AssetSummary {
            id: f.code.to_string(),
            name: f.name.to_string(),
            symbol: f.code.to_uppercase(),
            value: f.value,
            ratio: *ratio,
            change_24h: Some(f.change_24h),
            change_percent_24h: Some(f.change_percent_24h),
            amount: f.amount,
            current_price: f.price,
        })
        .collect();

    PortfolioSummary {
        total_value: 1_666_667.0,
        total_change_24h: 95_000.0,
        total_change_percent_24h: 2.4,
        assets,
        last_updated: now,
    }
}

const LIST_FIXTURES: [Fixture; 2] = [
    Fixture {
        code: "btc",
        name: "Bitcoin",
        amount: 0.5,
        price: 2_000_000.0,
        value: 1_000_000.0,
        change_24h: 100_000.0,
        change_percent_24h: 5.2,
    },
    Fixture {
        code: "eth",
        name: "Ethereum",
        amount: 2.0,
        price: 117_283.5,
        value: 234_567.0,
        change_24h: -2_500.0,
        change_percent_24h: -2.1,
    },
];

/// Placeholder asset list.
pub fn assets() -> Vec<NormalizedAsset> {
    LIST_FIXTURES.iter().map(placeholder_asset).collect()
}

fn history(prices: [f64; 3]) -> Vec<PriceHistoryPoint> {
    (1..=3)
        .zip(prices)
        .filter_map(|(day, price)| {
            let date = Utc.with_ymd_and_hms(2024, 7, day, 0, 0, 0).single()?;
            Some(PriceHistoryPoint {
                date,
                price,
                volume: None,
                market_cap: None,
            })
        })
        .collect()
}

/// Placeholder detail for an asset code.
///
/// `btc` and `eth` get a fixed three-day history; other codes get a zeroed
/// entry with no history.
pub fn detail(code: &str) -> AssetDetail {
    let code = code.trim().to_lowercase();
    let fixed = match code.as_str() {
        "btc" => Some((&LIST_FIXTURES[0], [1_900_000.0, 1_950_000.0, 2_000_000.0], 39e12, 2.5e12, 1)),
        "eth" => Some((&LIST_FIXTURES[1], [115_000.0, 119_000.0, 117_283.5], 14e12, 1.2e12, 2)),
        _ => None,
    };

    match fixed {
        Some((fixture, prices, market_cap, volume, rank)) => AssetDetail {
            asset: placeholder_asset(fixture),
            price_history: history(prices),
            market_cap: Some(market_cap),
            volume_24h: Some(volume),
            rank: Some(rank),
            supply: None,
            ath: None,
            atl: None,
            last_updated: None,
        },
        None => AssetDetail {
            asset: NormalizedAsset {
                id: code.clone(),
                name: code.to_uppercase(),
                symbol: code.to_uppercase(),
                amount: 0.0,
                value: 0.0,
                current_price: 0.0,
                change_24h: None,
                change_percent_24h: None,
            },
            price_history: Vec::new(),
            market_cap: Some(0.0),
            volume_24h: Some(0.0),
            rank: None,
            supply: Some(Supply {
                circulating: 0.0,
                total: 0.0,
                max: None,
            }),
            ath: None,
            atl: None,
            last_updated: None,
        },
    }
}
