//! Client for the public stock-quote API.
//!
//! Used by the dashboard and anything else running with direct network
//! access; the `/api/quote` proxy route is for browser callers.
//!
//! Responses are validated into the typed [`Quote`] map at this boundary.
//! A payload that does not match the contract is an error, never untyped
//! data passed deeper into the system.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use stockaim_common::config::{HEALTH_ENDPOINT, QUOTE_ENDPOINT};
use stockaim_common::models::Quote;
use stockaim_common::{Config, Error, Result};

/// Fixed identifying user agent sent to upstreams.
pub const USER_AGENT: &str = concat!("stockaim-gateway/", env!("CARGO_PKG_VERSION"));

/// Upstream call timeout. There are no retries on top of this.
pub const UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Build the shared upstream HTTP client.
pub(crate) fn default_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Client for the stock-quote API.
#[derive(Clone)]
pub struct StockApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl StockApiClient {
    /// Create a client from configuration with the default HTTP client.
    pub fn new(config: &Config) -> Self {
        Self::with_client(config, default_http_client())
    }

    /// Create a client sharing an existing HTTP client.
    pub fn with_client(config: &Config, client: reqwest::Client) -> Self {
        Self {
            base_url: config.stock_api.base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Fetch quotes for the given symbols, keyed by symbol.
    pub async fn fetch_quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>> {
        let url = format!("{}{}", self.base_url, QUOTE_ENDPOINT);

        tracing::debug!(url = %url, symbols = symbols.len(), "Fetching quotes from stock API");

        let response = self
            .client
            .get(&url)
            .query(&[("symbols", symbols.join(","))])
            .header("accept", "application/json")
            .header("user-agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(
                status.as_u16(),
                format!(
                    "Stock API error: {}",
                    status.canonical_reason().unwrap_or("unknown status")
                ),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        parse_quote_map(body)
    }

    /// Liveness probe against the quote API.
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}{}", self.base_url, HEALTH_ENDPOINT);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("user-agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(
                status.as_u16(),
                format!("Stock API health check returned {}", status.as_u16()),
            ));
        }
        Ok(())
    }
}

/// Validate a quote-API payload into a typed quote map.
///
/// The API returns an object keyed by symbol. Rows may omit the `symbol`
/// field; the map key fills it in.
fn parse_quote_map(body: Value) -> Result<HashMap<String, Quote>> {
    let Value::Object(rows) = body else {
        return Err(Error::ContractViolation(
            "quote response is not a JSON object".to_string(),
        ));
    };

    let mut quotes = HashMap::with_capacity(rows.len());
    for (symbol, row) in rows {
        let mut quote: Quote = serde_json::from_value(row)
            .map_err(|e| Error::ContractViolation(format!("quote row for {symbol}: {e}")))?;
        if quote.symbol.is_empty() {
            quote.symbol = symbol.clone();
        }
        quotes.insert(symbol, quote);
    }
    Ok(quotes)
}
