//! Integration tests for the quote proxy route.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use stockaim_common::Config;
use stockaim_gateway::routes::QUOTE_CACHE_CONTROL;
use stockaim_gateway::stock_api::USER_AGENT;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing the quote API at the given base URL. The backend is a
/// dead address; these tests never touch it.
fn config_with_stock_api(base_url: &str) -> Config {
    Config::from_lookup(|key| match key {
        "STOCKAIM_BACKEND_URL" => Some("http://127.0.0.1:1".to_string()),
        "STOCKAIM_BACKEND_ANON_KEY" => Some("test-anon-key-test-anon-key".to_string()),
        "STOCKAIM_STOCK_API_URL" => Some(base_url.to_string()),
        _ => None,
    })
}

/// Issue a GET and return the status, Cache-Control header, and JSON body.
async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cache_control = response
        .headers()
        .get(axum::http::header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    (status, cache_control, json)
}

#[tokio::test]
async fn missing_symbols_param_returns_400() {
    let app = stockaim_gateway::build_router(&config_with_stock_api("http://127.0.0.1:1"));

    let (status, _, body) = get_json(&app, "/api/quote").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Symbols parameter is required");
}

#[tokio::test]
async fn empty_symbols_param_returns_400() {
    let app = stockaim_gateway::build_router(&config_with_stock_api("http://127.0.0.1:1"));

    let (status, _, body) = get_json(&app, "/api/quote?symbols=").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn relays_upstream_json_with_cache_header() {
    let server = MockServer::start().await;
    let upstream = json!({"AAPL": {"price": 150.0}, "MSFT": {"price": 300.0}});

    Mock::given(method("GET"))
        .and(path("/quote"))
        .and(query_param("symbols", "AAPL,MSFT"))
        .and(header("user-agent", USER_AGENT))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let app = stockaim_gateway::build_router(&config_with_stock_api(&server.uri()));

    let (status, cache_control, body) = get_json(&app, "/api/quote?symbols=AAPL,MSFT").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control.as_deref(), Some(QUOTE_CACHE_CONTROL));
    assert_eq!(body, upstream);
}

#[tokio::test]
async fn accepts_legacy_symbol_param() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .and(query_param("symbols", "TSLA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"TSLA": {"price": 200.0}})))
        .expect(1)
        .mount(&server)
        .await;

    let app = stockaim_gateway::build_router(&config_with_stock_api(&server.uri()));

    let (status, _, body) = get_json(&app, "/api/quote?symbol=TSLA").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["TSLA"]["price"], 200.0);
}

#[tokio::test]
async fn relays_exact_upstream_error_status() {
    for upstream_status in [404u16, 429, 500, 503] {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(ResponseTemplate::new(upstream_status))
            .mount(&server)
            .await;

        let app = stockaim_gateway::build_router(&config_with_stock_api(&server.uri()));

        let (status, cache_control, body) = get_json(&app, "/api/quote?symbols=AAPL").await;

        assert_eq!(status.as_u16(), upstream_status);
        assert!(cache_control.is_none());
        assert_eq!(
            body["error"],
            format!("Stock API returned {upstream_status}")
        );
    }
}

#[tokio::test]
async fn transport_failure_returns_generic_500() {
    // Nothing listens on this port; the upstream call fails at connect.
    let app = stockaim_gateway::build_router(&config_with_stock_api("http://127.0.0.1:1"));

    let (status, _, body) = get_json(&app, "/api/quote?symbols=AAPL").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    // The cause is logged server-side, never surfaced.
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn unparseable_upstream_body_returns_generic_500() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let app = stockaim_gateway::build_router(&config_with_stock_api(&server.uri()));

    let (status, _, body) = get_json(&app, "/api/quote?symbols=AAPL").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}
