//! # Influx Provider
//!
//! Analytical query provider for InfluxDB. A declarative query (dimensions,
//! metrics, filters, timeframe) is compiled into one InfluxQL statement per
//! distinct collection and filter combination, the statements run
//! concurrently and their results are pivoted back into one row per
//! dimension tuple.
//!
//! ## Modules
//!
//! - [`query`]: Descriptor model, plan compiler, statement generator, executor, merger
//! - [`store`]: `SeriesStore` trait and the InfluxDB HTTP client
//! - [`provider`]: Connection lifecycle and the public operations
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use influx_provider::query::*;
//! use influx_provider::{Config, DefaultHelpers, InfluxProvider, QueryContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = InfluxProvider::open(&Config::load_default(), DefaultHelpers::shared())?;
//!
//!     let query = QueryDescriptor {
//!         dimensions: vec![Dimension::new("country", DimensionType::String)],
//!         metrics: vec![Metric::new("visits")
//!             .aggregation(Aggregation::Sum)
//!             .collection(CollectionRef::new("events"))],
//!         ..Default::default()
//!     };
//!
//!     let response = provider.query(&QueryContext::new("quick-start"), &query).await?;
//!     println!("{} rows", response.documents.len());
//!
//!     provider.close().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod flatten;
pub mod helpers;
pub mod provider;
pub mod query;
pub mod store;

// Re-export top-level types for convenience
pub use query::{
    MergedResult, PlanError, QueryDescriptor, QueryError, QueryPlan, QueryPlanner, QueryResult,
};

pub use store::{InfluxClient, InfluxConfig, SeriesStore, StoreError, StoreResult};

pub use provider::{
    CollectionStats, InfluxProvider, InsertOptions, PlanResponse, QueryContext, QueryResponse,
};

pub use helpers::{DefaultHelpers, Helpers};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{generate_default_config, ApiConfig, Config, ConfigError, LoggingConfig, QueryConfig};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level; `format = "json"` selects
/// structured output. Logs go to stderr so command output stays clean.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "influx_provider={},tower_http={}",
            logging.level, logging.level
        ))
    });
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
