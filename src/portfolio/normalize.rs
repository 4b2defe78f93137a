use tracing::debug;

use super::AssetMapping;
use crate::models::{NormalizedAsset, RawBalance, RawMarketEntry};

/// Parses a holding amount, accepting only finite values above zero.
fn parse_amount(raw: &str) -> Option<f64> {
    let amount: f64 = raw.trim().parse().ok()?;
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

/// Builds one asset from a holding and its market snapshot.
///
/// Returns `None` when the market price is unusable.
pub fn normalize_asset(code: &str, amount: f64, entry: &RawMarketEntry) -> Option<NormalizedAsset> {
    let price = entry.current_price;
    if !price.is_finite() || price < 0.0 || !amount.is_finite() || amount < 0.0 {
        return None;
    }

    Some(NormalizedAsset {
        id: code.to_lowercase(),
        name: entry.name.clone(),
        symbol: code.to_uppercase(),
        amount,
        value: amount * price,
        current_price: price,
        change_24h: entry.price_change_24h.filter(|v| v.is_finite()),
        change_percent_24h: entry.price_change_percentage_24h.filter(|v| v.is_finite()),
    })
}

/// Joins holdings with market snapshots.
///
/// Holdings in the reporting currency, with unparseable or non-positive
/// amounts, without a mapping, or without a market entry are dropped. The
/// output follows the balance order.
pub fn normalize(
    balance: Option<&RawBalance>,
    markets: &[RawMarketEntry],
    mapping: &AssetMapping,
    reporting_currency: &str,
) -> Vec<NormalizedAsset> {
    let Some(balance) = balance else {
        return Vec::new();
    };

    let mut assets = Vec::new();
    for (code, raw_amount) in &balance.holdings {
        if code.eq_ignore_ascii_case(reporting_currency) {
            continue;
        }
        let Some(amount) = parse_amount(raw_amount) else {
            continue;
        };
        let Some(market_id) = mapping.market_id(code) else {
            debug!(code = %code, "no market mapping for currency");
            continue;
        };
        let Some(entry) = markets.iter().find(|m| m.id == market_id) else {
            debug!(code = %code, market_id, "no market entry for currency");
            continue;
        };
        match normalize_asset(code, amount, entry) {
            Some(asset) => assets.push(asset),
            None => debug!(code = %code, price = entry.current_price, "invalid market price"),
        }
    }
    assets
}
