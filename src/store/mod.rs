//! Time-Series Store
//!
//! The connection boundary of the provider:
//!
//! - **SeriesStore**: async trait every store client implements
//! - **InfluxClient**: InfluxDB 1.x over HTTP
//! - **Line protocol**: point encoding for writes
//!
//! The query pipeline only needs [`SeriesStore::query`]; concurrent calls on
//! one client are expected to be safe.

mod error;
mod influx;
mod line_protocol;
mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use error::{StoreError, StoreResult};
pub use influx::{parse_query_response, InfluxClient, InfluxConfig};
pub use line_protocol::{encode_point, encode_points};
pub use types::{FieldValue, Point, RawResult, Series};

use async_trait::async_trait;

/// A column-oriented time-series store
#[async_trait]
pub trait SeriesStore: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &str;

    /// Database the store reads and writes
    fn database(&self) -> &str;

    /// Check the store is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Run one statement
    async fn query(&self, statement: &str) -> StoreResult<RawResult>;

    /// Write a batch of points
    async fn write_points(&self, points: &[Point]) -> StoreResult<()>;
}
