//! Shared foundation for StockAim services.
//!
//! Provides the environment-driven configuration, the unified error type,
//! logging initialization, and the data-transfer models exchanged with
//! the upstream quote API and the managed backend.

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod logging;
pub mod models;

pub use config::Config;
pub use error::{Error, Result};
