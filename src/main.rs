//! Influx Provider API Server
//!
//! Run with: cargo run --bin influx-provider
//!
//! Configuration is read from the first existing file among
//! `~/.config/influx-provider/config.toml`, `/etc/influx-provider/config.toml`
//! and `./config.toml`, then overridden by `INFLUX_PROVIDER_*` variables.
//! `RUST_LOG` overrides the configured log level.

use influx_provider::{init_tracing, serve, AppState, Config, DefaultHelpers, InfluxProvider};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    init_tracing(&config.logging);

    tracing::info!("Starting influx provider v{}", env!("CARGO_PKG_VERSION"));

    let provider = Arc::new(InfluxProvider::open(&config, DefaultHelpers::shared())?);

    match provider.check_connection().await {
        Ok(()) => tracing::info!("InfluxDB connection verified"),
        Err(e) => tracing::warn!("InfluxDB not reachable yet: {} (readiness will fail until it is)", e),
    }

    let state = AppState::new(provider, config.api.clone());
    serve(state, &config.api).await?;

    tracing::info!("Influx provider stopped");
    Ok(())
}
