//! Human-readable rendering of money, percentages and holdings for the CLI.
//!
//! Values stay `f64` everywhere else; they are converted to `Decimal` here only
//! so rounding and digit grouping are exact.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Display conventions for a reporting currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyStyle {
    pub symbol: Option<&'static str>,
    pub decimals: u32,
}

impl CurrencyStyle {
    pub fn for_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "JPY" => Self { symbol: Some("¥"), decimals: 0 },
            "KRW" => Self { symbol: Some("₩"), decimals: 0 },
            "USD" => Self { symbol: Some("$"), decimals: 2 },
            "EUR" => Self { symbol: Some("€"), decimals: 2 },
            "GBP" => Self { symbol: Some("£"), decimals: 2 },
            "BTC" => Self { symbol: Some("₿"), decimals: 8 },
            _ => Self { symbol: None, decimals: 2 },
        }
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

fn group_int_digits(int_part: &str) -> String {
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len.saturating_sub(i + 1);
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

fn pad_fraction_to_dp(s: &str, dp: u32) -> String {
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if dp == 0 {
        return int_part.to_string();
    }
    let mut frac: String = frac_part.chars().take(dp as usize).collect();
    while frac.len() < dp as usize {
        frac.push('0');
    }
    format!("{int_part}.{frac}")
}

fn group_number_string(s: &str) -> String {
    match s.split_once('.') {
        Some((i, f)) if !f.is_empty() => format!("{}.{f}", group_int_digits(i)),
        _ => group_int_digits(s),
    }
}

/// Format a value in the reporting currency, e.g. `¥1,234,567` or `-$12.50`.
///
/// Rounds half away from zero to the currency's usual precision. Codes
/// without a known symbol are suffixed instead (`1,234.00 CHF`).
pub fn format_money(value: f64, currency: &str) -> String {
    let style = CurrencyStyle::for_code(currency);
    let rounded =
        to_decimal(value).round_dp_with_strategy(style.decimals, RoundingStrategy::MidpointAwayFromZero);

    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = group_number_string(&pad_fraction_to_dp(&rounded.abs().to_string(), style.decimals));

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    match style.symbol {
        Some(sym) => {
            out.push_str(sym);
            out.push_str(&digits);
        }
        None => {
            out.push_str(&digits);
            out.push(' ');
            out.push_str(&currency.trim().to_ascii_uppercase());
        }
    }
    out
}

/// Format a signed money change, always carrying a sign (`+¥95,000`).
pub fn format_money_change(value: f64, currency: &str) -> String {
    let rendered = format_money(value, currency);
    if rendered.starts_with('-') {
        rendered
    } else {
        format!("+{rendered}")
    }
}

/// Format a percentage with two decimals and an explicit sign. Missing
/// values render as `-`.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => {
            let rounded = to_decimal(v).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            let body = pad_fraction_to_dp(&rounded.abs().to_string(), 2);
            if rounded.is_sign_negative() && !rounded.is_zero() {
                format!("-{body}%")
            } else {
                format!("+{body}%")
            }
        }
        None => "-".to_string(),
    }
}

/// Format a ratio in `[0, 1]` as a share of the portfolio (`81.0%`).
pub fn format_share(ratio: f64) -> String {
    let pct = to_decimal(ratio * 100.0).round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{}%", pad_fraction_to_dp(&pct.to_string(), 1))
}

/// Format a holding amount with up to 8 decimals and no trailing zeros.
pub fn format_amount(amount: f64) -> String {
    to_decimal(amount)
        .round_dp_with_strategy(8, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string()
}
