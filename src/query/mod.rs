//! Query Engine
//!
//! Turns a backend-agnostic query descriptor into per-collection statements,
//! runs them against the store and pivots the results back together:
//!
//! - **Model**: Query descriptor types (dimensions, metrics, filters, timeframe)
//! - **Plan**: Compile a descriptor into a [`QueryPlan`] of ColQueries
//! - **Statement**: Render a ColQuery as an InfluxQL statement
//! - **Executor**: Dispatch every statement concurrently
//! - **Merge**: Pivot the raw results into one row per dimension tuple
//!
//! # Pipeline
//!
//! ```text
//! QueryDescriptor → QueryPlanner::compile → QueryPlan
//!     → ParallelExecutor::execute → map<key, RawResult>
//!     → merge → MergedResult
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use influx_provider::query::*;
//!
//! let query = QueryDescriptor {
//!     dimensions: vec![Dimension::new("country", DimensionType::String)],
//!     metrics: vec![Metric::new("visits")
//!         .aggregation(Aggregation::Sum)
//!         .collection(CollectionRef::new("events"))],
//!     ..Default::default()
//! };
//!
//! let plan = QueryPlanner::new(helpers.clone()).compile(&query)?;
//! let raw = ParallelExecutor::new(store, StatementRenderer::default())
//!     .execute(&plan)
//!     .await?;
//! let result = merge(helpers, &plan, &raw);
//! ```

mod error;
mod executor;
mod merge;
mod model;
mod plan;
mod statement;

pub use error::{PlanError, QueryError, QueryResult};
pub use executor::{ParallelExecutor, RawResults};
pub use merge::{
    merge, normalize_column, MergedResult, ResultMerger, ID_FIELD, KEY_FIELD, NOT_SET,
    TIMESTAMP_FIELD,
};
pub use model::{
    parse_instant, Aggregation, CollectionRef, Dimension, DimensionType, Filter, Interval,
    Metric, Operator, QueryDescriptor, Timeframe, PLACEHOLDER_METRIC_KEY,
};
pub use plan::{
    Clauses, ColQuery, GroupExpr, Grouping, MatchClause, ProjectExpr, Projection, QueryPlan,
    QueryPlanner, SortKey, TIME_COLUMN,
};
pub use statement::{quote_ident, render, StatementRenderer};
