//! Configuration for StockAim services.
//!
//! All values come from the process environment and are resolved once at
//! startup. The resulting `Config` is immutable and passed explicitly to
//! whatever needs it; there is no module-level global.
//!
//! # Resolution priority per field
//!
//! 1. Explicit environment override
//! 2. Derived default (backend url + fixed suffix, or the public quote API)
//! 3. Empty string
//!
//! # Environment Variable Mapping
//!
//! ## Backend
//! - `STOCKAIM_BACKEND_URL` → backend.url
//! - `STOCKAIM_BACKEND_ANON_KEY` → backend.anon_key
//!
//! ## Stock API
//! - `STOCKAIM_STOCK_API_URL` → stock_api.base_url
//!
//! ## Function overrides
//! - `STOCKAIM_UPDATE_STOCKS_URL` → functions.update_stocks
//! - `STOCKAIM_SCREENER_URL` → functions.screener
//!
//! ## Server / observability
//! - `STOCKAIM_BIND_ADDRESS`, `STOCKAIM_PORT`
//! - `STOCKAIM_LOG_LEVEL`, `STOCKAIM_LOG_FORMAT`
//!
//! ## Load policy
//! - `STOCKAIM_CONFIG_LENIENT` — set to `true`/`1` to log a warning and
//!   continue when the configuration is invalid instead of failing startup.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default base URL of the public stock-quote API.
pub const DEFAULT_STOCK_API_URL: &str = "https://stock-api-x35p.vercel.app";

/// Quote endpoint on the stock API.
pub const QUOTE_ENDPOINT: &str = "/quote";

/// Health endpoint on the stock API.
pub const HEALTH_ENDPOINT: &str = "/health";

/// Suffix appended to the backend URL for the update-stocks function.
const UPDATE_STOCKS_SUFFIX: &str = "/functions/v1/update-stocks";

/// Suffix appended to the backend URL for the screener function.
const SCREENER_SUFFIX: &str = "/functions/v1/screener";

/// The anonymous credential must be longer than this to be considered
/// plausible. A length check, not cryptographic validation.
pub const MIN_ANON_KEY_LEN: usize = 20;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4500;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_FORMAT: &str = "pretty";

// ============================================================================
// Config groups
// ============================================================================

/// Managed backend (row store + serverless functions).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendConfig {
    /// Base URL of the backend project.
    pub url: String,
    /// Anonymous credential. Row-level security is enforced upstream.
    pub anon_key: String,
}

/// Public stock-quote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockApiConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
}

impl StockApiConfig {
    /// Full URL of the quote endpoint.
    pub fn quote_url(&self) -> String {
        format!("{}{}", self.base_url, QUOTE_ENDPOINT)
    }

    /// Full URL of the health endpoint.
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url, HEALTH_ENDPOINT)
    }
}

impl Default for StockApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STOCK_API_URL.to_string(),
        }
    }
}

/// Backend function endpoints, each independently overridable.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FunctionsConfig {
    /// URL of the update-stocks function.
    pub update_stocks: String,
    /// URL of the screener function.
    pub screener: String,
}

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Default is local only; set `0.0.0.0` for remote access.
    pub bind: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Output format: "json" or "pretty".
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

// ============================================================================
// Config
// ============================================================================

/// Process-wide configuration, resolved once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub backend: BackendConfig,
    pub stock_api: StockApiConfig,
    pub functions: FunctionsConfig,
    pub server: ServerConfig,
    pub observability: ObservabilityConfig,
    /// When true, an invalid configuration logs a warning instead of
    /// failing startup.
    pub lenient: bool,
}

impl Config {
    /// Resolve configuration through an arbitrary key lookup.
    ///
    /// `Config::load` passes the process environment; tests pass a map so
    /// they never touch shared env state.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = lookup("STOCKAIM_BACKEND_URL").unwrap_or_default();
        let anon_key = lookup("STOCKAIM_BACKEND_ANON_KEY").unwrap_or_default();

        let update_stocks = lookup("STOCKAIM_UPDATE_STOCKS_URL")
            .unwrap_or_else(|| derive_function_url(&backend_url, UPDATE_STOCKS_SUFFIX));
        let screener = lookup("STOCKAIM_SCREENER_URL")
            .unwrap_or_else(|| derive_function_url(&backend_url, SCREENER_SUFFIX));

        let port = lookup("STOCKAIM_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            backend: BackendConfig {
                url: backend_url,
                anon_key,
            },
            stock_api: StockApiConfig {
                base_url: lookup("STOCKAIM_STOCK_API_URL")
                    .unwrap_or_else(|| DEFAULT_STOCK_API_URL.to_string()),
            },
            functions: FunctionsConfig {
                update_stocks,
                screener,
            },
            server: ServerConfig {
                bind: lookup("STOCKAIM_BIND_ADDRESS")
                    .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
                port,
            },
            observability: ObservabilityConfig {
                log_level: lookup("STOCKAIM_LOG_LEVEL")
                    .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
                log_format: lookup("STOCKAIM_LOG_FORMAT")
                    .unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_string()),
            },
            lenient: lookup("STOCKAIM_CONFIG_LENIENT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// Fails fast when the backend URL or credential is missing or
    /// malformed, unless `STOCKAIM_CONFIG_LENIENT` is set, in which case
    /// the resolved (possibly empty) values are used. Load runs before a
    /// logging subscriber exists, so lenient-mode problems are the
    /// caller's to report once logging is up; `invalid_fields` carries
    /// the list. There is no placeholder fallback in either mode.
    pub fn load() -> Result<Self> {
        let config = Self::from_lookup(|key| std::env::var(key).ok());
        config.ensure_valid()?;
        Ok(config)
    }

    /// Error unless the configuration is valid or lenient mode is on.
    pub fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() || self.lenient {
            return Ok(());
        }
        Err(Error::Config(format!(
            "invalid or missing configuration: {} \
             (set STOCKAIM_CONFIG_LENIENT=true to start anyway)",
            self.invalid_fields().join(", ")
        )))
    }

    /// True when the backend URL has an HTTP(S) scheme and the anonymous
    /// credential is plausibly long enough.
    pub fn is_valid(&self) -> bool {
        self.invalid_fields().is_empty()
    }

    /// The environment keys whose resolved values fail validation.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let url = &self.backend.url;
        if url.is_empty() || !(url.starts_with("http://") || url.starts_with("https://")) {
            fields.push("STOCKAIM_BACKEND_URL");
        }
        if self.backend.anon_key.len() <= MIN_ANON_KEY_LEN {
            fields.push("STOCKAIM_BACKEND_ANON_KEY");
        }
        fields
    }
}

/// Derive a function URL by appending a fixed suffix to the backend URL.
/// Empty when the backend URL itself is unset.
fn derive_function_url(backend_url: &str, suffix: &str) -> String {
    if backend_url.is_empty() {
        String::new()
    } else {
        format!("{}{}", backend_url.trim_end_matches('/'), suffix)
    }
}
