use chrono::{DateTime, Utc};

use crate::models::{AssetSummary, NormalizedAsset, PortfolioSummary};

/// Reduces normalized assets to portfolio totals.
///
/// Ratios and the weighted percent change are all zero when the total value
/// is zero. Missing 24h changes count as zero.
pub fn summarize(assets: &[NormalizedAsset], now: DateTime<Utc>) -> PortfolioSummary {
    let total_value: f64 = assets.iter().map(|a| a.value).sum();
    let weight = |value: f64| if total_value > 0.0 { value / total_value } else { 0.0 };

    let total_change_24h = assets
        .iter()
        .map(|a| a.amount * a.change_24h.unwrap_or(0.0))
        .sum();
    let total_change_percent_24h = assets
        .iter()
        .map(|a| weight(a.value) * a.change_percent_24h.unwrap_or(0.0))
        .sum();

    let summaries = assets
        .iter()
        .map(|a| AssetSummary {
            id: a.id.clone(),
            name: a.name.clone(),
            symbol: a.symbol.clone(),
            value: a.value,
            ratio: weight(a.value),
            change_24h: a.change_24h,
            change_percent_24h: a.change_percent_24h,
            amount: a.amount,
            current_price: a.current_price,
        })
        .collect();

    PortfolioSummary {
        total_value,
        total_change_24h,
        total_change_percent_24h,
        assets: summaries,
        last_updated: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn asset(id: &str, amount: f64, price: f64, change: Option<f64>, pct: Option<f64>) -> NormalizedAsset {
        NormalizedAsset {
            id: id.to_string(),
            name: id.to_uppercase(),
            symbol: id.to_uppercase(),
            amount,
            value: amount * price,
            current_price: price,
            change_24h: change,
            change_percent_24h: pct,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 22, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_input_gives_zero_summary() {
        let summary = summarize(&[], now());
        assert_eq!(summary, PortfolioSummary::empty(now()));
    }

    #[test]
    fn ratios_sum_to_one() {
        let assets = vec![
            asset("btc", 0.5, 2_000_000.0, None, None),
            asset("eth", 2.0, 117_283.5, None, None),
        ];
        let summary = summarize(&assets, now());

        assert!((summary.total_value - 1_234_567.0).abs() < 1e-6);
        assert!((summary.assets[0].ratio - 0.8100).abs() < 1e-4);
        assert!((summary.assets[1].ratio - 0.1900).abs() < 1e-4);
        let sum: f64 = summary.assets.iter().map(|a| a.ratio).sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_total_gives_zero_ratios() {
        let assets = vec![asset("btc", 1.0, 0.0, Some(10.0), Some(3.0))];
        let summary = summarize(&assets, now());
        assert_eq!(summary.total_value, 0.0);
        assert_eq!(summary.assets[0].ratio, 0.0);
        assert_eq!(summary.total_change_percent_24h, 0.0);
    }

    #[test]
    fn change_is_value_weighted() {
        let assets = vec![
            asset("btc", 0.5, 2_000_000.0, Some(100_000.0), Some(5.2)),
            asset("eth", 2.0, 117_283.5, Some(-2_500.0), Some(-2.1)),
        ];
        let summary = summarize(&assets, now());

        let expected_pct = (1_000_000.0 * 5.2 + 234_567.0 * -2.1) / 1_234_567.0;
        assert!((summary.total_change_percent_24h - expected_pct).abs() < 1e-9);
        assert!((summary.total_change_24h - (50_000.0 - 5_000.0)).abs() < 1e-9);
        assert_eq!(summary.last_updated, now());
    }
}
