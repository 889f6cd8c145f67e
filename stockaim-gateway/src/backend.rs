//! Client for the managed backend: PostgREST-style row reads and the
//! update-stocks function.
//!
//! Reads carry the anonymous credential; the backend enforces row-level
//! security server-side, not this layer. The client is constructed
//! explicitly and carried in application state, never a module global.

use axum::http::header;
use serde::de::DeserializeOwned;
use serde_json::json;
use stockaim_common::models::{Quote, TickerRow, UpdateStocksResponse};
use stockaim_common::{Config, Error, Result};

use crate::stock_api::default_http_client;

/// Primary mirror table.
const STOCKS_TABLE: &str = "stocks";

/// Legacy ticker listing table.
const TICKERS_TABLE: &str = "stock_tickers";

/// Per-table cap on search results.
pub const SEARCH_LIMIT: u32 = 20;

/// Strip characters that PostgREST treats as structure inside an `or=`
/// logic tree. Without this, a comma or parenthesis in the search term
/// splits the expression into bogus filter clauses.
fn sanitize_search_term(query: &str) -> String {
    query
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '"' | '\\' | '*'))
        .collect()
}

/// Client for the backend row store and functions.
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    anon_key: String,
    update_stocks_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    /// Create a client from configuration with the default HTTP client.
    pub fn new(config: &Config) -> Self {
        Self::with_client(config, default_http_client())
    }

    /// Create a client sharing an existing HTTP client.
    pub fn with_client(config: &Config, client: reqwest::Client) -> Self {
        Self {
            base_url: config.backend.url.trim_end_matches('/').to_string(),
            anon_key: config.backend.anon_key.clone(),
            update_stocks_url: config.functions.update_stocks.clone(),
            client,
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Run a filtered select against a table and parse the rows.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = self.rest_url(table);

        tracing::debug!(url = %url, "Backend select");

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.anon_key))
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: format!("Database error on {table}"),
                details: Some(details),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        serde_json::from_str(&body)
            .map_err(|e| Error::ContractViolation(format!("rows from {table}: {e}")))
    }

    /// Fetch rows whose symbol is in the given set.
    ///
    /// An empty symbol set or no matching rows yields an empty vec, not an
    /// error.
    pub async fn fetch_stocks(&self, symbols: &[String]) -> Result<Vec<Quote>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        self.select(
            STOCKS_TABLE,
            &[
                ("select", "*".to_string()),
                ("symbol", format!("in.({})", symbols.join(","))),
            ],
        )
        .await
    }

    /// Top rows by descending volume, price and volume both non-null.
    pub async fn top_stocks(&self, limit: u32) -> Result<Vec<Quote>> {
        self.select(
            STOCKS_TABLE,
            &[
                ("select", "*".to_string()),
                ("price", "not.is.null".to_string()),
                ("volume", "not.is.null".to_string()),
                ("order", "volume.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    /// Case-insensitive partial match on symbol or name in the primary table.
    pub async fn search_stocks(&self, query: &str) -> Result<Vec<Quote>> {
        let term = sanitize_search_term(query);
        self.select(
            STOCKS_TABLE,
            &[
                ("select", "*".to_string()),
                ("or", format!("(symbol.ilike.*{term}*,name.ilike.*{term}*)")),
                ("price", "not.is.null".to_string()),
                ("limit", SEARCH_LIMIT.to_string()),
            ],
        )
        .await
    }

    /// Case-insensitive partial match against the legacy ticker table.
    pub async fn search_tickers(&self, query: &str) -> Result<Vec<TickerRow>> {
        let term = sanitize_search_term(query);
        self.select(
            TICKERS_TABLE,
            &[
                ("select", "*".to_string()),
                (
                    "or",
                    format!("(\"Symbol\".ilike.*{term}*,\"Company Name\".ilike.*{term}*)"),
                ),
                ("limit", SEARCH_LIMIT.to_string()),
            ],
        )
        .await
    }

    /// Invoke the update-stocks function for the given symbols.
    ///
    /// On a non-success status the error carries the upstream `error`
    /// field, or a generic fallback when the body had none.
    pub async fn update_stocks(&self, symbols: &[String]) -> Result<UpdateStocksResponse> {
        let url = &self.update_stocks_url;

        tracing::info!(url = %url, symbols = symbols.len(), "Invoking update-stocks function");

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", self.anon_key))
            .json(&json!({ "symbols": symbols }))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Error bodies are not guaranteed to be the JSON envelope (a
            // proxy 502 may be HTML), so take the error field best-effort.
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<UpdateStocksResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| "Failed to update stocks".to_string());
            return Err(Error::upstream(status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| Error::ContractViolation(format!("update-stocks response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockaim_common::config::Config;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.backend.url = "https://abc.supabase.co/".to_string();
        config.backend.anon_key = "anon-key-anon-key-anon-key".to_string();
        config.functions.update_stocks =
            "https://abc.supabase.co/functions/v1/update-stocks".to_string();
        config
    }

    #[test]
    fn test_rest_url_trims_trailing_slash() {
        let client = BackendClient::new(&test_config());
        assert_eq!(
            client.rest_url("stocks"),
            "https://abc.supabase.co/rest/v1/stocks"
        );
    }

    #[test]
    fn test_sanitize_search_term_strips_filter_structure() {
        assert_eq!(sanitize_search_term("apple"), "apple");
        assert_eq!(sanitize_search_term("a,b(c)d"), "abcd");
        assert_eq!(sanitize_search_term("\"Symbol\".ilike.*x*"), "Symbol.ilike.x");
        assert_eq!(sanitize_search_term("(),\"\\*"), "");
        // Characters with no filter meaning pass through.
        assert_eq!(sanitize_search_term("amazon.com inc"), "amazon.com inc");
    }

    #[tokio::test]
    async fn test_fetch_stocks_empty_set_short_circuits() {
        // No network call is made for an empty symbol set.
        let client = BackendClient::new(&test_config());
        let rows = client.fetch_stocks(&[]).await.unwrap();
        assert!(rows.is_empty());
    }
}
