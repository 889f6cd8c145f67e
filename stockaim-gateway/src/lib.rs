//! StockAim Gateway - API proxy and dashboard for the stock screener.
//!
//! This crate is a thin routing layer in front of two upstreams:
//!
//! ```text
//! Browser → Gateway ─┬→ /api/quote    → stock-quote API
//!                    ├→ /api/screener → backend screener function
//!                    └→ /             → backend row store (dashboard)
//! ```
//!
//! No data is stored or mutated here; every route forwards to an upstream
//! and relays or reshapes its response.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod backend;
pub mod dashboard;
pub mod routes;
pub mod stock_api;

pub use backend::BackendClient;
pub use routes::{AppState, ErrorResponse, HealthResponse};
pub use stock_api::StockApiClient;

use axum::Router;
use std::net::SocketAddr;
use stockaim_common::Config;
use tower_http::cors::{Any, CorsLayer};

/// Build the gateway router with all routes and middleware.
pub fn build_router(config: &Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::build_all_routes(config).layer(cors)
}

/// Start the gateway server.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let addr = SocketAddr::from((
        config.server.bind.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    let router = build_router(config);

    tracing::info!("Starting StockAim Gateway on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
