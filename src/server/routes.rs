use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::error::ApiError;
use super::AppState;
use crate::models::{AssetDetail, ConnectionReport, HighLow, NormalizedAsset, PortfolioSummary, Sourced, Supply};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryAsset {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub value: f64,
    pub ratio: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub total_value: f64,
    pub total_change_24h: f64,
    pub total_change_percent_24h: f64,
    pub assets: Vec<SummaryAsset>,
    pub last_updated: DateTime<Utc>,
    pub is_fallback: bool,
}

impl From<Sourced<PortfolioSummary>> for SummaryResponse {
    fn from(sourced: Sourced<PortfolioSummary>) -> Self {
        let is_fallback = sourced.is_fallback();
        let summary = sourced.into_inner();
        Self {
            total_value: summary.total_value,
            total_change_24h: summary.total_change_24h,
            total_change_percent_24h: summary.total_change_percent_24h,
            assets: summary
                .assets
                .into_iter()
                .map(|a| SummaryAsset {
                    id: a.id,
                    name: a.name,
                    symbol: a.symbol,
                    value: a.value,
                    ratio: a.ratio,
                })
                .collect(),
            last_updated: summary.last_updated,
            is_fallback,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetItem {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub amount: f64,
    pub value: f64,
    pub current_price: f64,
    /// 24h percent change, 0 when unknown.
    pub change_24h: f64,
}

impl From<NormalizedAsset> for AssetItem {
    fn from(a: NormalizedAsset) -> Self {
        Self {
            id: a.id,
            name: a.name,
            symbol: a.symbol,
            amount: a.amount,
            value: a.value,
            current_price: a.current_price,
            change_24h: a.change_percent_24h.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsResponse {
    pub assets: Vec<AssetItem>,
    pub is_fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryPoint {
    pub date: DateTime<Utc>,
    pub price: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailResponse {
    #[serde(flatten)]
    pub asset: AssetItem,
    pub price_history: Vec<HistoryPoint>,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub rank: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supply: Option<Supply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ath: Option<HighLow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atl: Option<HighLow>,
    pub is_fallback: bool,
}

impl From<Sourced<AssetDetail>> for DetailResponse {
    fn from(sourced: Sourced<AssetDetail>) -> Self {
        let is_fallback = sourced.is_fallback();
        let detail = sourced.into_inner();
        Self {
            asset: detail.asset.into(),
            price_history: detail
                .price_history
                .into_iter()
                .map(|p| HistoryPoint {
                    date: p.date,
                    price: p.price,
                })
                .collect(),
            market_cap: detail.market_cap.unwrap_or(0.0),
            volume_24h: detail.volume_24h.unwrap_or(0.0),
            rank: detail.rank.unwrap_or(0),
            supply: detail.supply,
            ath: detail.ath,
            atl: detail.atl,
            is_fallback,
        }
    }
}

pub async fn portfolio_summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    info!("GET /api/portfolio-summary");
    Json(state.service.summary().await.into())
}

pub async fn list_assets(State(state): State<AppState>) -> Json<AssetsResponse> {
    info!("GET /api/assets");
    let sourced = state.service.assets().await;
    let is_fallback = sourced.is_fallback();
    Json(AssetsResponse {
        assets: sourced.into_inner().into_iter().map(AssetItem::from).collect(),
        is_fallback,
    })
}

pub async fn asset_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DetailResponse>, ApiError> {
    info!(id = %id, "GET /api/assets/{{id}}");
    let detail = state.service.asset_detail(&id).await?;
    Ok(Json(detail.into()))
}

pub async fn test_connections(State(state): State<AppState>) -> Json<ConnectionReport> {
    info!("GET /api/test-connections");
    Json(state.service.check_connections().await)
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
