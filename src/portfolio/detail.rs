use chrono::{DateTime, Utc};

use super::normalize::normalize_asset;
use crate::models::{AssetDetail, HighLow, MarketChart, NormalizedAsset, PriceHistoryPoint, RawMarketEntry, Supply};

fn timestamp(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64)
}

/// Turns a market chart into price history points.
///
/// One point per price sample, in the order given. Volume and market cap are
/// taken from the same position in their series, so a shorter series leaves
/// the field unset rather than zero. Samples with an invalid timestamp are
/// skipped.
pub fn price_history_from_chart(chart: &MarketChart) -> Vec<PriceHistoryPoint> {
    chart
        .prices
        .iter()
        .enumerate()
        .filter_map(|(i, [ts, price])| {
            Some(PriceHistoryPoint {
                date: timestamp(*ts)?,
                price: *price,
                volume: chart.total_volumes.get(i).map(|[_, v]| *v),
                market_cap: chart.market_caps.get(i).map(|[_, v]| *v),
            })
        })
        .collect()
}

fn high_low(value: Option<f64>, date: &Option<String>, change: Option<f64>) -> Option<HighLow> {
    value.map(|value| HighLow {
        value,
        date: date.clone(),
        change_percentage: change,
    })
}

/// Builds the detail view for one asset.
///
/// `code` is the exchange currency code the asset is shown under.
pub fn build_detail(
    entry: &RawMarketEntry,
    code: &str,
    amount: f64,
    price_history: Vec<PriceHistoryPoint>,
) -> AssetDetail {
    let amount = if amount.is_finite() && amount > 0.0 { amount } else { 0.0 };
    let asset = normalize_asset(code, amount, entry).unwrap_or_else(|| NormalizedAsset {
        id: code.to_lowercase(),
        name: entry.name.clone(),
        symbol: code.to_uppercase(),
        amount,
        value: 0.0,
        current_price: 0.0,
        change_24h: None,
        change_percent_24h: None,
    });

    let circulating = entry.circulating_supply.unwrap_or(0.0);
    let supply = Supply {
        circulating,
        total: entry.total_supply.unwrap_or(circulating),
        max: entry.max_supply,
    };

    AssetDetail {
        asset,
        price_history,
        market_cap: entry.market_cap,
        volume_24h: entry.total_volume,
        rank: entry.market_cap_rank,
        supply: Some(supply),
        ath: high_low(entry.ath, &entry.ath_date, entry.ath_change_percentage),
        atl: high_low(entry.atl, &entry.atl_date, entry.atl_change_percentage),
        last_updated: entry.last_updated.clone(),
    }
}
