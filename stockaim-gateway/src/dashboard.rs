//! Dashboard view: ranked stock list with a two-table search mode.
//!
//! The page is rendered server-side per request. Default mode shows the
//! top rows by volume; a non-empty `q` parameter switches to search mode,
//! which fans out to the primary table and the legacy ticker table
//! concurrently and merges both result sets, de-duplicated by symbol.

use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::response::Html;
use serde::{Deserialize, Serialize};
use stockaim_common::models::{IndexSnapshot, MarketSummary, Quote, TickerRow};
use stockaim_common::Result;

use crate::backend::BackendClient;
use crate::routes::AppState;

/// Rows shown in the default ranked view.
pub const TOP_STOCKS_LIMIT: u32 = 50;

const EMPTY_DB_NOTICE: &str =
    "No stocks found in database. Please run the update-stocks function first.";

/// A stock row as displayed: every missing numeric becomes 0 and a
/// missing name falls back to the symbol. A rendering policy, not a
/// data-correctness claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayStock {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub market_cap: Option<f64>,
}

impl From<Quote> for DisplayStock {
    fn from(quote: Quote) -> Self {
        Self {
            name: quote.name.unwrap_or_else(|| quote.symbol.clone()),
            symbol: quote.symbol,
            price: quote.price.unwrap_or(0.0),
            change_percent: quote.change_percent.unwrap_or(0.0),
            volume: quote.volume.unwrap_or(0.0),
            market_cap: quote.market_cap,
        }
    }
}

impl From<TickerRow> for DisplayStock {
    fn from(row: TickerRow) -> Self {
        Self {
            name: row.company_name.unwrap_or_else(|| row.symbol.clone()),
            symbol: row.symbol,
            price: 0.0,
            change_percent: 0.0,
            volume: 0.0,
            market_cap: None,
        }
    }
}

/// Which listing the page shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewMode {
    Top,
    Search(String),
}

/// Everything one dashboard render needs.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub mode: ViewMode,
    pub stocks: Vec<DisplayStock>,
    pub notice: Option<String>,
    pub summary: MarketSummary,
}

/// Placeholder index snapshots. Cosmetic only, not fetched from any live
/// source.
pub fn market_summary() -> MarketSummary {
    MarketSummary {
        sp500: IndexSnapshot {
            price: 4567.89,
            change: 23.45,
            change_percent: 0.52,
        },
        nasdaq: IndexSnapshot {
            price: 14321.76,
            change: -67.89,
            change_percent: -0.47,
        },
    }
}

/// Load the data for the given mode.
pub async fn load(backend: &BackendClient, mode: ViewMode) -> Result<DashboardData> {
    match mode {
        ViewMode::Top => load_top(backend).await,
        ViewMode::Search(query) => search(backend, query).await,
    }
}

async fn load_top(backend: &BackendClient) -> Result<DashboardData> {
    let rows = backend.top_stocks(TOP_STOCKS_LIMIT).await?;

    // An empty mirror is advisory, not a failure.
    let notice = rows.is_empty().then(|| EMPTY_DB_NOTICE.to_string());

    Ok(DashboardData {
        mode: ViewMode::Top,
        stocks: rows.into_iter().map(Into::into).collect(),
        notice,
        summary: market_summary(),
    })
}

/// Two concurrent lookups joined on an all-complete barrier; either side
/// failing fails the whole search.
async fn search(backend: &BackendClient, query: String) -> Result<DashboardData> {
    let (stocks, tickers) = tokio::try_join!(
        backend.search_stocks(&query),
        backend.search_tickers(&query),
    )?;

    Ok(DashboardData {
        mode: ViewMode::Search(query),
        stocks: merge_results(stocks, tickers),
        notice: None,
        summary: market_summary(),
    })
}

/// Merge both search result sets, de-duplicated by symbol. Rows from the
/// primary table win; legacy ticker rows fill in listings the mirror does
/// not have yet.
pub fn merge_results(stocks: Vec<Quote>, tickers: Vec<TickerRow>) -> Vec<DisplayStock> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut results = Vec::with_capacity(stocks.len() + tickers.len());

    for row in stocks {
        if seen.insert(row.symbol.clone()) {
            results.push(row.into());
        }
    }
    for row in tickers {
        if seen.insert(row.symbol.clone()) {
            results.push(row.into());
        }
    }

    results
}

/// Dashboard query parameters.
#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// GET / — render the dashboard, optionally in search mode (`?q=...`).
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Html<String> {
    let mode = match params.q.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => ViewMode::Search(query.to_string()),
        _ => ViewMode::Top,
    };
    let is_search = matches!(mode, ViewMode::Search(_));

    match load(&state.backend, mode).await {
        Ok(data) => Html(render(&data)),
        Err(e) => {
            tracing::error!(error = %e, "Dashboard load failed");
            let message = if is_search {
                format!("Search failed: {e}")
            } else {
                format!("Failed to load dashboard data: {e}")
            };
            Html(render_error(&message))
        }
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// US-dollar price with thousands grouping, two decimals.
pub fn format_price(price: f64) -> String {
    let fixed = format!("{:.2}", price.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let int_grouped: String = grouped.chars().rev().collect();

    let sign = if price < 0.0 { "-" } else { "" };
    format!("{sign}${int_grouped}.{frac_part}")
}

/// Compact volume with B/M/K suffixes.
pub fn format_volume(volume: f64) -> String {
    if volume >= 1e9 {
        format!("{:.1}B", volume / 1e9)
    } else if volume >= 1e6 {
        format!("{:.1}M", volume / 1e6)
    } else if volume >= 1e3 {
        format!("{:.1}K", volume / 1e3)
    } else {
        format!("{}", volume as i64)
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn page_shell(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>StockAim Screener</title>\n</head>\n<body>\n\
         <h1>StockAim Screener</h1>\n\
         <form method=\"get\" action=\"/\">\n\
         <input type=\"search\" name=\"q\" placeholder=\"Search symbol or name\">\n\
         <button type=\"submit\">Search</button>\n\
         </form>\n{body}\n</body>\n</html>\n"
    )
}

fn summary_section(summary: &MarketSummary) -> String {
    let index = |name: &str, snap: &IndexSnapshot| {
        format!(
            "<li>{name}: {} ({:+.2}, {:+.2}%)</li>\n",
            format_price(snap.price),
            snap.change,
            snap.change_percent
        )
    };
    format!(
        "<ul class=\"market-summary\">\n{}{}</ul>\n",
        index("S&amp;P 500", &summary.sp500),
        index("NASDAQ", &summary.nasdaq)
    )
}

/// Render a loaded dashboard.
pub fn render(data: &DashboardData) -> String {
    let heading = match &data.mode {
        ViewMode::Top => "Top Stocks".to_string(),
        ViewMode::Search(query) => format!("Search Results for \"{}\"", escape(query)),
    };

    let mut body = summary_section(&data.summary);
    body.push_str(&format!("<h2>{heading}</h2>\n"));

    if let Some(notice) = &data.notice {
        body.push_str(&format!("<p class=\"notice\">{}</p>\n", escape(notice)));
    }

    body.push_str(
        "<table>\n<tr><th>Symbol</th><th>Name</th><th>Price</th>\
         <th>Change</th><th>Volume</th><th>Market Cap</th></tr>\n",
    );
    for stock in &data.stocks {
        let market_cap = stock
            .market_cap
            .map(|cap| format!("${}", format_volume(cap)))
            .unwrap_or_else(|| "-".to_string());
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:+.2}%</td><td>{}</td><td>{}</td></tr>\n",
            escape(&stock.symbol),
            escape(&stock.name),
            format_price(stock.price),
            stock.change_percent,
            format_volume(stock.volume),
            market_cap,
        ));
    }
    body.push_str("</table>\n");

    if matches!(data.mode, ViewMode::Search(_)) {
        body.push_str("<p><a href=\"/\">Back to Top Stocks</a></p>\n");
    }

    page_shell(&body)
}

/// Render an error page with a retry link.
pub fn render_error(message: &str) -> String {
    page_shell(&format!(
        "<div class=\"error\"><p>Error</p><p>{}</p>\
         <p><a href=\"/\">Try Again</a></p></div>",
        escape(message)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(symbol: &str) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            name: None,
            price: None,
            change_percent: None,
            volume: None,
            market_cap: None,
            shares_float: None,
            relative_volume: None,
        }
    }

    #[test]
    fn test_display_stock_zero_defaults_nulls() {
        let display: DisplayStock = quote("AAPL").into();
        assert_eq!(display.symbol, "AAPL");
        assert_eq!(display.name, "AAPL"); // name falls back to symbol
        assert_eq!(display.price, 0.0);
        assert_eq!(display.change_percent, 0.0);
        assert_eq!(display.volume, 0.0);
        assert!(display.market_cap.is_none());
    }

    #[test]
    fn test_display_stock_keeps_present_values() {
        let display: DisplayStock = Quote {
            name: Some("Apple Inc.".to_string()),
            price: Some(150.25),
            volume: Some(50_000_000.0),
            ..quote("AAPL")
        }
        .into();
        assert_eq!(display.name, "Apple Inc.");
        assert_eq!(display.price, 150.25);
        assert_eq!(display.volume, 50_000_000.0);
    }

    #[test]
    fn test_merge_deduplicates_by_symbol_primary_wins() {
        let stocks = vec![Quote {
            name: Some("Apple Inc.".to_string()),
            price: Some(150.0),
            ..quote("AAPL")
        }];
        let tickers = vec![
            TickerRow {
                symbol: "AAPL".to_string(),
                company_name: Some("Apple (legacy listing)".to_string()),
            },
            TickerRow {
                symbol: "AAPD".to_string(),
                company_name: Some("Direxion AAPL Bear".to_string()),
            },
        ];

        let merged = merge_results(stocks, tickers);

        assert_eq!(merged.len(), 2);
        // Primary row wins over the legacy duplicate.
        assert_eq!(merged[0].symbol, "AAPL");
        assert_eq!(merged[0].name, "Apple Inc.");
        assert_eq!(merged[0].price, 150.0);
        // Legacy-only listing survives the merge with zeroed numerics.
        assert_eq!(merged[1].symbol, "AAPD");
        assert_eq!(merged[1].price, 0.0);
    }

    #[test]
    fn test_merge_preserves_order_within_sources() {
        let stocks = vec![quote("B"), quote("A")];
        let merged = merge_results(stocks, Vec::new());
        assert_eq!(merged[0].symbol, "B");
        assert_eq!(merged[1].symbol, "A");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(150.0), "$150.00");
        assert_eq!(format_price(0.0), "$0.00");
        assert_eq!(format_price(1234567.891), "$1,234,567.89");
        assert_eq!(format_price(-45.5), "-$45.50");
    }

    #[test]
    fn test_format_volume() {
        assert_eq!(format_volume(2_500_000_000.0), "2.5B");
        assert_eq!(format_volume(50_000_000.0), "50.0M");
        assert_eq!(format_volume(1_500.0), "1.5K");
        assert_eq!(format_volume(999.0), "999");
        assert_eq!(format_volume(0.0), "0");
    }

    #[test]
    fn test_render_escapes_and_includes_rows() {
        let data = DashboardData {
            mode: ViewMode::Search("<script>".to_string()),
            stocks: vec![DisplayStock {
                symbol: "AAPL".to_string(),
                name: "Apple & Co".to_string(),
                price: 150.0,
                change_percent: 1.5,
                volume: 1_000_000.0,
                market_cap: None,
            }],
            notice: None,
            summary: market_summary(),
        };

        let html = render(&data);
        assert!(html.contains("AAPL"));
        assert!(html.contains("Apple &amp; Co"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("$150.00"));
        assert!(html.contains("Back to Top Stocks"));
    }

    #[test]
    fn test_render_shows_empty_db_notice() {
        let data = DashboardData {
            mode: ViewMode::Top,
            stocks: Vec::new(),
            notice: Some(EMPTY_DB_NOTICE.to_string()),
            summary: market_summary(),
        };
        let html = render(&data);
        assert!(html.contains("update-stocks"));
        assert!(!html.contains("Back to Top Stocks"));
    }

    #[test]
    fn test_render_error_offers_retry() {
        let html = render_error("Search failed: boom");
        assert!(html.contains("Search failed: boom"));
        assert!(html.contains("Try Again"));
    }
}
