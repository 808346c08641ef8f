//! Parallel Executor
//!
//! Renders every sub-query of a plan and dispatches them to the store at
//! once, one task per [`ColQuery`](crate::query::plan::ColQuery).
//!
//! # Execution Pipeline
//!
//! ```text
//! QueryPlan → render (per ColQuery) → spawn (per statement) → join → map<key, RawResult>
//! ```
//!
//! The join is fail-fast: the first failing statement is returned and the
//! remaining results are discarded. Tasks already dispatched are detached and
//! run to completion on their own.

use futures_util::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::query::error::{QueryError, QueryResult};
use crate::query::plan::QueryPlan;
use crate::query::statement::StatementRenderer;
use crate::store::{RawResult, SeriesStore};

/// Raw results keyed by ColQuery key
pub type RawResults = BTreeMap<String, RawResult>;

/// Fans a plan out to the store
#[derive(Clone)]
pub struct ParallelExecutor {
    store: Arc<dyn SeriesStore>,
    renderer: StatementRenderer,
}

impl ParallelExecutor {
    pub fn new(store: Arc<dyn SeriesStore>, renderer: StatementRenderer) -> Self {
        Self { store, renderer }
    }

    /// Rendered statements keyed by ColQuery key
    pub fn statements(&self, plan: &QueryPlan) -> BTreeMap<String, String> {
        plan.col_queries
            .iter()
            .map(|(key, col_query)| (key.clone(), self.renderer.render(col_query)))
            .collect()
    }

    /// Execute every sub-query concurrently
    pub async fn execute(&self, plan: &QueryPlan) -> QueryResult<RawResults> {
        let start = Instant::now();

        let handles: Vec<_> = self
            .statements(plan)
            .into_iter()
            .map(|(key, statement)| {
                tracing::debug!(col_query = %key, statement = %statement, "Dispatching sub-query");
                let store = Arc::clone(&self.store);
                tokio::spawn(async move {
                    let result = store.query(&statement).await;
                    (key, result)
                })
            })
            .collect();

        let results = try_join_all(handles.into_iter().map(|handle| async move {
            match handle.await {
                Ok((key, Ok(raw))) => Ok((key, raw)),
                Ok((key, Err(e))) => {
                    tracing::warn!(col_query = %key, error = %e, "Sub-query failed");
                    Err(QueryError::Store(e))
                }
                Err(e) => Err(QueryError::Execution(e.to_string())),
            }
        }))
        .await?;

        tracing::debug!(
            plan = %plan.uid,
            sub_queries = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Executed query plan"
        );

        Ok(results.into_iter().collect())
    }
}
