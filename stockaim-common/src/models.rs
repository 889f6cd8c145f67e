//! Data-transfer models exchanged with the quote API and the backend.
//!
//! Nothing here is persisted or mutated by this codebase; these are the
//! wire shapes of upstream rows and responses, validated at the boundary.

use serde::{Deserialize, Serialize};

/// A stock row, as mirrored in the backend or returned by the quote API.
///
/// Every numeric is nullable at the source; display-level defaulting is
/// the dashboard's job, not this type's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub shares_float: Option<f64>,
    #[serde(default)]
    pub relative_volume: Option<f64>,
}

/// Row in the legacy `stock_tickers` listing table.
///
/// That table predates the mirror and uses quoted, capitalized column
/// names on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRow {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Company Name", default)]
    pub company_name: Option<String>,
}

/// Job-result envelope returned by the update-stocks function.
///
/// None of these fields are computed here; they are type-checked and
/// surfaced as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateStocksResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Snapshot of a single market index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
}

/// Two-index market summary shown on the dashboard. Placeholder values,
/// cosmetic only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub sp500: IndexSnapshot,
    pub nasdaq: IndexSnapshot,
}
