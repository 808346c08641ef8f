//! InfluxDB Provider
//!
//! Ties the query pipeline to a connected [`SeriesStore`]. The provider owns
//! the connection lifecycle; every store-backed operation on a closed
//! provider fails with [`QueryError::NotConnected`].

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::Instrument;

use crate::config::{Config, QueryConfig};
use crate::flatten::flatten;
use crate::helpers::Helpers;
use crate::query::{
    merge, parse_instant, quote_ident, CollectionRef, Dimension, Metric, ParallelExecutor,
    QueryDescriptor, QueryError, QueryPlan, QueryPlanner, QueryResult, StatementRenderer,
    TIME_COLUMN, TIMESTAMP_FIELD,
};
use crate::store::{InfluxClient, Point, SeriesStore, StoreError};

/// Per-request context carried into log spans
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub request_id: String,
}

impl QueryContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    /// Context with a freshly generated request id
    pub fn generate(helpers: &dyn Helpers) -> Self {
        Self::new(helpers.uuid())
    }
}

/// Options for [`InfluxProvider::insert`]
#[derive(Debug, Clone, Default)]
pub struct InsertOptions {
    /// Field holding each document's time, looked up before `time`/`timestamp`
    pub time_field: Option<String>,
}

/// Merged query output
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub dimensions: Vec<Dimension>,
    pub metrics: Vec<Metric>,
    pub documents: Vec<Map<String, Value>>,
    pub queryplan: QueryPlan,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<String>,
}

/// Compiled plan with its rendered statements
#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub queryplan: QueryPlan,
    /// Statement text keyed by ColQuery key
    pub statements: BTreeMap<String, String>,
}

/// Point counts of a collection
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub collection: String,
    /// `count_<field>` → number of points
    pub counts: Map<String, Value>,
}

/// Query provider backed by InfluxDB
pub struct InfluxProvider {
    helpers: Arc<dyn Helpers>,
    planner: QueryPlanner,
    renderer: StatementRenderer,
    store: RwLock<Option<Arc<dyn SeriesStore>>>,
}

impl InfluxProvider {
    /// Create a closed provider
    pub fn new(helpers: Arc<dyn Helpers>, config: &QueryConfig) -> Self {
        Self {
            planner: QueryPlanner::new(Arc::clone(&helpers))
                .with_default_interval(config.default_interval.clone()),
            renderer: StatementRenderer::new(config.fill_zero),
            helpers,
            store: RwLock::new(None),
        }
    }

    /// Create a provider connected to the configured InfluxDB server
    pub fn open(config: &Config, helpers: Arc<dyn Helpers>) -> QueryResult<Self> {
        let client = InfluxClient::new(config.influx.clone())?;
        tracing::info!(
            url = %config.influx.url,
            database = %config.influx.database,
            "Initialized influxDB provider"
        );

        Ok(Self {
            store: RwLock::new(Some(Arc::new(client))),
            ..Self::new(helpers, &config.query)
        })
    }

    /// Create a provider over an existing store
    pub fn with_store(
        store: Arc<dyn SeriesStore>,
        helpers: Arc<dyn Helpers>,
        config: &QueryConfig,
    ) -> Self {
        Self {
            store: RwLock::new(Some(store)),
            ..Self::new(helpers, config)
        }
    }

    pub fn helpers(&self) -> &Arc<dyn Helpers> {
        &self.helpers
    }

    /// Drop the connection
    pub async fn close(&self) {
        if let Some(store) = self.store.write().await.take() {
            tracing::info!(provider = %store.name(), "Closed connection");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.store.read().await.is_some()
    }

    async fn store(&self) -> QueryResult<Arc<dyn SeriesStore>> {
        self.store
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(QueryError::NotConnected)
    }

    /// Ping the store
    pub async fn check_connection(&self) -> QueryResult<()> {
        let store = self.store().await?;
        store.ping().await?;
        Ok(())
    }

    /// Compile and render a descriptor without touching the store
    pub fn plan(&self, descriptor: &QueryDescriptor) -> QueryResult<PlanResponse> {
        let queryplan = self.planner.compile(descriptor)?;
        let statements = queryplan
            .col_queries
            .iter()
            .map(|(key, col_query)| (key.clone(), self.renderer.render(col_query)))
            .collect();

        Ok(PlanResponse {
            queryplan,
            statements,
        })
    }

    /// Compile, execute and merge a query
    pub async fn query(
        &self,
        ctx: &QueryContext,
        descriptor: &QueryDescriptor,
    ) -> QueryResult<QueryResponse> {
        let span = tracing::info_span!("query", request_id = %ctx.request_id);

        async {
            let start = Instant::now();
            let store = self.store().await?;

            let plan = self.planner.compile(descriptor)?;
            let raw = ParallelExecutor::new(store, self.renderer)
                .execute(&plan)
                .await?;
            let merged = merge(Arc::clone(&self.helpers), &plan, &raw);

            tracing::info!(
                plan = %plan.uid,
                documents = merged.documents.len(),
                anomalies = merged.anomalies.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Query completed"
            );

            Ok(QueryResponse {
                dimensions: merged.dimensions,
                metrics: merged.metrics,
                documents: merged.documents,
                queryplan: plan,
                anomalies: merged.anomalies,
            })
        }
        .instrument(span)
        .await
    }

    /// Flatten and write documents into a collection
    pub async fn insert(
        &self,
        ctx: &QueryContext,
        collection: &CollectionRef,
        documents: &[Value],
        options: &InsertOptions,
    ) -> QueryResult<usize> {
        let store = self.store().await?;
        let now = Utc::now().timestamp_millis();

        let points = documents
            .iter()
            .map(|document| {
                let mut flat = flatten(document);
                let timestamp = take_time(&mut flat, options).unwrap_or(now);
                Point::from_flat(collection.store_key(), &flat, timestamp)
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        store.write_points(&points).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            collection = %collection.key,
            points = points.len(),
            "Inserted documents"
        );
        Ok(points.len())
    }

    /// Count the points of a collection
    pub async fn stats(&self, collection: &CollectionRef) -> QueryResult<CollectionStats> {
        let store = self.store().await?;
        let statement = format!("SELECT count(*) FROM {}", quote_ident(collection.store_key()));
        let raw = store.query(&statement).await?;

        let counts = raw
            .series
            .iter()
            .flat_map(|series| series.rows())
            .next()
            .map(|mut row| {
                row.remove(TIME_COLUMN);
                row
            })
            .unwrap_or_default();

        Ok(CollectionStats {
            collection: collection.key.clone(),
            counts,
        })
    }

    /// Remove every series of a collection
    pub async fn drop_collection(&self, collection: &CollectionRef) -> QueryResult<()> {
        let store = self.store().await?;
        let statement = format!("DROP SERIES FROM {}", quote_ident(collection.store_key()));
        store.query(&statement).await?;

        tracing::info!(collection = %collection.key, "Dropped collection");
        Ok(())
    }

    /// Drop the whole database
    pub async fn purge(&self) -> QueryResult<()> {
        let store = self.store().await?;
        let statement = format!("DROP DATABASE {}", quote_ident(store.database()));
        store.query(&statement).await?;

        tracing::warn!(database = %store.database(), "Purged database");
        Ok(())
    }
}

/// Remove the time columns from a flattened document, returning epoch ms
fn take_time(flat: &mut Map<String, Value>, options: &InsertOptions) -> Option<i64> {
    // Every candidate is removed so none is written as a column
    let candidates: Vec<(&str, Value)> = options
        .time_field
        .as_deref()
        .into_iter()
        .chain([TIME_COLUMN, TIMESTAMP_FIELD])
        .filter_map(|field| flat.remove(field).map(|value| (field, value)))
        .collect();

    candidates.iter().find_map(|(field, value)| match parse_instant(value) {
        Some(instant) => Some(instant.timestamp_millis()),
        None => {
            tracing::warn!(field = %field, value = %value, "Ignoring unparseable document time");
            None
        }
    })
}
