//! Route definitions for the StockAim gateway.
//!
//! Two proxy routes (`/api/quote`, `/api/screener`), the dashboard page,
//! and a health check. The proxy routes forward to their upstream and
//! relay or reshape the response; transport-level detail is logged
//! server-side and never leaks to callers.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use stockaim_common::Config;

use crate::backend::BackendClient;
use crate::dashboard;
use crate::stock_api::{default_http_client, USER_AGENT};

/// Cache policy attached to successful quote responses: shared caching for
/// 60 seconds with background revalidation for up to 120 more.
pub const QUOTE_CACHE_CONTROL: &str = "public, s-maxage=60, stale-while-revalidate=120";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub backend: BackendClient,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

/// Quote query parameters. `symbol` is the legacy spelling.
#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    #[serde(default)]
    pub symbols: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl QuoteParams {
    /// The effective symbol list: `symbols` wins over legacy `symbol`,
    /// empty strings count as absent.
    fn effective(self) -> Option<String> {
        self.symbols
            .filter(|s| !s.is_empty())
            .or(self.symbol.filter(|s| !s.is_empty()))
    }
}

/// Build the complete router with all routes.
pub fn build_all_routes(config: &Config) -> Router {
    let config = Arc::new(config.clone());
    let http = default_http_client();
    let backend = BackendClient::with_client(&config, http.clone());

    let state = AppState {
        config,
        http,
        backend,
    };

    Router::new()
        .route("/", get(dashboard::dashboard_handler))
        .route("/api/quote", get(quote_handler))
        .route("/api/screener", post(screener_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// GET /health
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
    })
}

/// GET /api/quote?symbols=AAPL,MSFT
///
/// Forwards the symbol list to the quote API and relays the JSON body
/// verbatim. Upstream non-success statuses are relayed as-is.
pub async fn quote_handler(
    State(state): State<AppState>,
    Query(params): Query<QuoteParams>,
) -> Response {
    let Some(symbols) = params.effective() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Symbols parameter is required")),
        )
            .into_response();
    };

    let url = state.config.stock_api.quote_url();

    let result = state
        .http
        .get(&url)
        .query(&[("symbols", symbols.as_str())])
        .header(header::USER_AGENT, USER_AGENT)
        .header(header::ACCEPT, "application/json")
        .send()
        .await;

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, url = %url, "Quote API request failed");
            return internal_error();
        }
    };

    let status = response.status();
    if !status.is_success() {
        return (
            relay_status(status.as_u16()),
            Json(ErrorResponse::new(format!(
                "Stock API returned {}",
                status.as_u16()
            ))),
        )
            .into_response();
    }

    match response.json::<Value>().await {
        Ok(data) => (
            StatusCode::OK,
            [(header::CACHE_CONTROL, QUOTE_CACHE_CONTROL)],
            Json(data),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, url = %url, "Quote API returned an unparseable body");
            internal_error()
        }
    }
}

/// POST /api/screener
///
/// Pure pass-through: the raw body goes to the screener function
/// unchanged, with the anonymous bearer credential attached. Semantic
/// validation of the filter payload is entirely the function's job.
pub async fn screener_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let url = state.config.functions.screener.clone();

    tracing::info!(
        url = %url,
        body = %String::from_utf8_lossy(&body),
        "Screener request"
    );

    let result = state
        .http
        .post(&url)
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", state.config.backend.anon_key),
        )
        .body(body.to_vec())
        .send()
        .await;

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, url = %url, "Screener request failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_details(
                    "Failed to process screener request",
                    e.to_string(),
                )),
            )
                .into_response();
        }
    };

    let status = response.status();
    tracing::info!(status = %status, url = %url, "Screener function responded");

    if !status.is_success() {
        // Error bodies are not guaranteed to be JSON; relay them as text.
        let details = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::error!(status = %status, details = %details, "Screener function error");
        return (
            relay_status(status.as_u16()),
            Json(ErrorResponse::with_details(
                format!("Screener function error: {}", status.as_u16()),
                details,
            )),
        )
            .into_response();
    }

    match response.json::<Value>().await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, url = %url, "Screener function returned an unparseable body");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_details(
                    "Failed to process screener request",
                    e.to_string(),
                )),
            )
                .into_response()
        }
    }
}

/// Convert an upstream status code into a relayed response status.
fn relay_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
        .into_response()
}
