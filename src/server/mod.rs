//! JSON API over the portfolio service.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{AssetItem, AssetsResponse, DetailResponse, SummaryResponse};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::{GovernorError, GovernorLayer};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::portfolio::PortfolioService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PortfolioService>,
}

impl AppState {
    pub fn new(service: Arc<PortfolioService>) -> Self {
        Self { service }
    }
}

/// Allows the listed origins, or any origin when the list is empty.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.trim().parse().ok())
        .collect();

    let allow_origin = if parsed.is_empty() {
        if !origins.is_empty() {
            warn!("cors_origins contains no valid origins, allowing any");
        }
        AllowOrigin::any()
    } else {
        info!(origins = parsed.len(), "CORS restricted to configured origins");
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(24 * 60 * 60))
}

/// Renders quota rejections as `{"error", "retryAfter"}` with a 429 status.
fn rate_limit_response(err: GovernorError) -> Response {
    match err {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": "Too many requests", "retryAfter": wait_time })),
            )
                .into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(wait_time));
            response
        }
        GovernorError::UnableToExtractKey => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Unable to identify client" })),
        )
            .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Rate limiter failure" })),
        )
            .into_response(),
    }
}

/// Builds the API router.
///
/// The `/api` routes are rate limited per client when
/// `server.rate_limit.enabled` is set. Clients are keyed by forwarding
/// headers, then by peer address. `/health` is never limited.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let mut api = Router::new()
        .route(
            "/api/portfolio-summary",
            get(routes::portfolio_summary).fallback(routes::method_not_allowed),
        )
        .route(
            "/api/assets",
            get(routes::list_assets).fallback(routes::method_not_allowed),
        )
        .route(
            "/api/assets/{id}",
            get(routes::asset_detail).fallback(routes::method_not_allowed),
        )
        .route(
            "/api/test-connections",
            get(routes::test_connections).fallback(routes::method_not_allowed),
        );

    let limit = &server.rate_limit;
    if limit.enabled {
        let governor = GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .period(limit.replenish_interval())
            .burst_size(limit.requests)
            .finish();
        match governor {
            Some(config) => {
                info!(requests = limit.requests, window = ?limit.window, "API rate limit enabled");
                api = api.layer(GovernorLayer::new(config).error_handler(rate_limit_response));
            }
            None => warn!("invalid rate limit settings, API rate limiting disabled"),
        }
    }

    api.route("/health", get(routes::health))
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `bind` and serves until `shutdown` resolves.
pub async fn serve<F>(router: Router, bind: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("Server error")
}
