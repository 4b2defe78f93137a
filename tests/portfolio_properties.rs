//! Property tests for the normalize and summarize stages.

use chrono::{TimeZone, Utc};
use coinfolio::models::{NormalizedAsset, RawBalance, RawMarketEntry};
use coinfolio::portfolio::{normalize, summarize, AssetMapping};
use proptest::prelude::*;

// =============================================================================
// Generators
// =============================================================================

const MAPPED: [(&str, &str); 5] = [
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("ada", "cardano"),
    ("dot", "polkadot"),
    ("link", "chainlink"),
];

fn relative_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * a.abs().max(b.abs()).max(f64::MIN_POSITIVE)
}

/// A positive holding amount as the exchange would report it.
fn arb_amount() -> impl Strategy<Value = f64> {
    prop_oneof![1e-8f64..1.0, 1.0f64..1e6]
}

fn arb_price() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), 1e-6f64..1.0, 1.0f64..1e8]
}

/// A balance holding a random subset of the mapped codes, plus the
/// reporting currency and an unmapped code, with one price per mapped code.
fn arb_portfolio() -> impl Strategy<Value = (RawBalance, Vec<RawMarketEntry>)> {
    (
        proptest::sample::subsequence(MAPPED.to_vec(), 0..=MAPPED.len()),
        proptest::collection::vec(arb_amount(), MAPPED.len()),
        proptest::collection::vec(arb_price(), MAPPED.len()),
        proptest::collection::vec(-50.0f64..50.0, MAPPED.len()),
    )
        .prop_map(|(held, amounts, prices, changes)| {
            let mut balance = RawBalance::new(true).with_holding("jpy", "10000");
            for ((code, _), amount) in held.iter().zip(&amounts) {
                balance = balance.with_holding(*code, amount.to_string());
            }
            balance = balance.with_holding("xrp", "42");

            let markets = MAPPED
                .iter()
                .zip(prices.iter().zip(&changes))
                .map(|((code, id), (price, pct))| {
                    RawMarketEntry::new(*id, *code, id.to_uppercase(), *price)
                        .with_change(price * pct / 100.0, *pct)
                })
                .collect();
            (balance, markets)
        })
}

fn arb_asset() -> impl Strategy<Value = NormalizedAsset> {
    (
        "[a-z]{3,5}",
        arb_amount(),
        arb_price(),
        proptest::option::of(-1e5f64..1e5),
        proptest::option::of(-50.0f64..50.0),
    )
        .prop_map(|(id, amount, price, change, pct)| NormalizedAsset {
            name: id.to_uppercase(),
            symbol: id.to_uppercase(),
            id,
            amount,
            value: amount * price,
            current_price: price,
            change_24h: change,
            change_percent_24h: pct,
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn normalized_value_is_amount_times_price((balance, markets) in arb_portfolio()) {
        let assets = normalize(Some(&balance), &markets, &AssetMapping::default(), "JPY");

        for asset in &assets {
            prop_assert!(asset.amount > 0.0);
            prop_assert!(
                relative_eq(asset.value, asset.amount * asset.current_price, 1e-9),
                "{} value {} != {} * {}",
                asset.id, asset.value, asset.amount, asset.current_price
            );
        }
    }

    #[test]
    fn normalize_keeps_only_mapped_holdings_in_balance_order(
        (balance, markets) in arb_portfolio()
    ) {
        let assets = normalize(Some(&balance), &markets, &AssetMapping::default(), "JPY");

        let expected: Vec<&str> = balance
            .holdings
            .iter()
            .map(|(code, _)| code.as_str())
            .filter(|code| MAPPED.iter().any(|(c, _)| c == code))
            .collect();
        let ids: Vec<&str> = assets.iter().map(|a| a.id.as_str()).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn ratios_sum_to_one_when_total_is_positive(
        assets in proptest::collection::vec(arb_asset(), 0..12)
    ) {
        let now = Utc.with_ymd_and_hms(2024, 7, 22, 12, 0, 0).unwrap();
        let summary = summarize(&assets, now);

        let total: f64 = assets.iter().map(|a| a.value).sum();
        prop_assert!(relative_eq(summary.total_value, total, 1e-12) || total == 0.0);

        let ratio_sum: f64 = summary.assets.iter().map(|a| a.ratio).sum();
        if summary.total_value > 0.0 {
            prop_assert!((ratio_sum - 1.0).abs() <= 1e-6, "ratio sum {}", ratio_sum);
        } else {
            prop_assert_eq!(ratio_sum, 0.0);
        }
        for asset in &summary.assets {
            prop_assert!((0.0..=1.0 + 1e-12).contains(&asset.ratio));
        }
    }

    #[test]
    fn summary_of_normalized_portfolio_is_consistent((balance, markets) in arb_portfolio()) {
        let now = Utc.with_ymd_and_hms(2024, 7, 22, 12, 0, 0).unwrap();
        let assets = normalize(Some(&balance), &markets, &AssetMapping::default(), "JPY");
        let summary = summarize(&assets, now);

        prop_assert_eq!(summary.assets.len(), assets.len());
        let expected_change: f64 = assets
            .iter()
            .map(|a| a.amount * a.change_24h.unwrap_or(0.0))
            .sum();
        prop_assert!(
            (summary.total_change_24h - expected_change).abs()
                <= 1e-9 * expected_change.abs().max(1.0)
        );
        if summary.total_value > 0.0 {
            let ratio_sum: f64 = summary.assets.iter().map(|a| a.ratio).sum();
            prop_assert!((ratio_sum - 1.0).abs() <= 1e-6);
        }
    }
}
