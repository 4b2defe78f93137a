use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub value: f64,
    /// Share of the portfolio's total value, in [0, 1].
    pub ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent_24h: Option<f64>,
    pub amount: f64,
    pub current_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: f64,
    /// Absolute change in value over 24h, in the reporting currency.
    pub total_change_24h: f64,
    /// Value-weighted average of the assets' 24h percent change.
    pub total_change_percent_24h: f64,
    pub assets: Vec<AssetSummary>,
    pub last_updated: DateTime<Utc>,
}

impl PortfolioSummary {
    pub fn empty(last_updated: DateTime<Utc>) -> Self {
        Self {
            total_value: 0.0,
            total_change_24h: 0.0,
            total_change_percent_24h: 0.0,
            assets: Vec::new(),
            last_updated,
        }
    }
}
