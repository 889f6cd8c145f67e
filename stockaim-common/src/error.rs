//! Error types for StockAim services.

use thiserror::Error;

/// Result type alias using the StockAim error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for StockAim services.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input or request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upstream service returned a non-success status
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// Upstream payload did not match the expected shape
    #[error("Upstream contract violation: {0}")]
    ContractViolation(String),

    /// Network or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build an upstream error without diagnostic detail.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
            details: None,
        }
    }

    /// Check if this error came from an upstream status.
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }

    /// Get HTTP status code for this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Upstream { status, .. } => *status,
            Self::ContractViolation(_) => 502,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(Error::upstream(503, "down").status_code(), 503);
        assert_eq!(Error::ContractViolation("bad row".into()).status_code(), 502);
        assert_eq!(Error::Network("refused".into()).status_code(), 500);
        assert_eq!(Error::Internal("boom".into()).status_code(), 500);
        assert_eq!(Error::Config("missing".into()).status_code(), 500);
    }

    #[test]
    fn test_upstream_display_uses_message() {
        let err = Error::Upstream {
            status: 503,
            message: "Screener function error: 503".into(),
            details: Some("rate limited".into()),
        };
        assert_eq!(err.to_string(), "Screener function error: 503");
        assert!(err.is_upstream());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Json(_)));
        assert_eq!(err.status_code(), 500);
    }
}
