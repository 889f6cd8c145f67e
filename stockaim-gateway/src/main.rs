//! StockAim Gateway - Main entry point.

use anyhow::Result;
use stockaim_common::logging::init_logging;
use stockaim_common::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Fails fast on invalid configuration unless STOCKAIM_CONFIG_LENIENT is set
    let config = Config::load()?;

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("StockAim Gateway v{}", env!("CARGO_PKG_VERSION"));

    // Lenient-mode validation problems are reported here, after the
    // subscriber is installed, so the warning actually reaches the logs.
    if !config.is_valid() {
        tracing::warn!(
            invalid = %config.invalid_fields().join(", "),
            "Configuration is invalid; continuing in lenient mode"
        );
    }

    stockaim_gateway::start_server(&config).await
}
