use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A holding joined with its market price, in the reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAsset {
    /// Lowercase exchange currency code (e.g. "btc").
    pub id: String,
    pub name: String,
    /// Uppercase ticker (e.g. "BTC").
    pub symbol: String,
    pub amount: f64,
    /// `amount * current_price`.
    pub value: f64,
    pub current_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent_24h: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryPoint {
    pub date: DateTime<Utc>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supply {
    pub circulating: f64,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// All-time high or low as reported by the market source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighLow {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDetail {
    #[serde(flatten)]
    pub asset: NormalizedAsset,
    pub price_history: Vec<PriceHistoryPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supply: Option<Supply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ath: Option<HighLow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atl: Option<HighLow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}
