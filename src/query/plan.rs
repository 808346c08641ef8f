//! Query Plan Compiler
//!
//! Compiles a [`QueryDescriptor`] into a [`QueryPlan`]: a map of deduplicated
//! per-collection sub-queries ([`ColQuery`]).
//!
//! # Compilation
//!
//! ```text
//! timeframe + filters ─┐
//! dimensions ──────────┼─> base clauses ─┬─> metric A (events, f1) ─┐
//!                      │                 ├─> metric B (events, f1) ─┼─> ColQuery hash(events + f1)
//!                      │                 └─> metric C (pages,  f1) ───> ColQuery hash(pages + f1)
//! ```
//!
//! Metrics whose collection and folded match clause hash identically share a
//! single ColQuery; each contributes its aggregate to the shared projection
//! under its own key.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::helpers::Helpers;
use crate::query::error::PlanError;
use crate::query::model::{
    parse_instant, Aggregation, CollectionRef, Dimension, DimensionType, Filter, Interval, Metric,
    Operator, QueryDescriptor, Timeframe,
};

/// Physical time column in the store
pub const TIME_COLUMN: &str = "time";

/// Format used for time-range literals in match clauses
const TIME_LITERAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Field → operator → value predicates, ordered for deterministic keying
pub type MatchClause = BTreeMap<String, BTreeMap<Operator, Value>>;

/// What a projection column selects
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectExpr {
    /// A raw column, used for non-date dimensions
    Column { column: String },
    /// The time-bucket column of a time-series query
    Time,
    /// An aggregate over a metric attribute
    Aggregate {
        aggregation: Aggregation,
        attribute: String,
    },
}

/// One projection entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub alias: String,
    pub expr: ProjectExpr,
}

/// What a group-by entry groups on
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupExpr {
    Column { column: String },
    /// `time(1<suffix>)`
    TimeBucket { interval: String },
}

/// One group-by entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grouping {
    pub key: String,
    pub expr: GroupExpr,
}

/// Ordering echoed in the plan for diagnostics; statements do not render it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

/// Clauses of a single sub-query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clauses {
    #[serde(rename = "match")]
    pub matches: MatchClause,
    /// Projection columns in insertion order
    pub project: Vec<Projection>,
    pub group: Vec<Grouping>,
    /// Diagnostic only, never rendered into a statement
    pub sort: Vec<SortKey>,
    /// Row cap realised as a top-N projection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl Default for Clauses {
    fn default() -> Self {
        Self {
            matches: MatchClause::new(),
            project: Vec::new(),
            group: Vec::new(),
            sort: vec![SortKey {
                column: TIME_COLUMN.to_string(),
                descending: true,
            }],
            limit: None,
        }
    }
}

impl Clauses {
    /// Fold a filter into the match clause as `{field: {operator: value}}`
    pub fn with_filter(mut self, filter: &Filter) -> Self {
        self.matches
            .entry(filter.field.clone())
            .or_default()
            .insert(filter.operator, filter.value.clone());
        self
    }

    /// Insert or replace a projection, keeping its original position
    pub fn with_projection(mut self, alias: &str, expr: ProjectExpr) -> Self {
        match self.project.iter_mut().find(|p| p.alias == alias) {
            Some(existing) => existing.expr = expr,
            None => self.project.push(Projection {
                alias: alias.to_string(),
                expr,
            }),
        }
        self
    }

    pub fn with_grouping(mut self, key: &str, expr: GroupExpr) -> Self {
        match self.group.iter_mut().find(|g| g.key == key) {
            Some(existing) => existing.expr = expr,
            None => self.group.push(Grouping {
                key: key.to_string(),
                expr,
            }),
        }
        self
    }

    /// Add projections from `other` that are not already present
    pub fn with_projections_from(mut self, other: &Clauses) -> Self {
        for projection in &other.project {
            if !self.project.iter().any(|p| p.alias == projection.alias) {
                self.project.push(projection.clone());
            }
        }
        self
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn projection(&self, alias: &str) -> Option<&ProjectExpr> {
        self.project.iter().find(|p| p.alias == alias).map(|p| &p.expr)
    }
}

/// One deduplicated sub-query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColQuery {
    /// hash(collection key + match JSON)
    pub key: String,
    /// Logical collection key
    pub collection: String,
    /// Physical measurement name
    pub collections: String,
    pub query: Clauses,
    /// Keys of the metrics served by this sub-query
    pub metrics: Vec<String>,
}

/// Compiled execution plan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPlan {
    pub uid: String,
    /// Reserved for cost-based planning
    pub cost: u64,
    pub col_queries: BTreeMap<String, ColQuery>,
    pub dimensions: Vec<Dimension>,
    pub metrics: Vec<Metric>,
    /// Plan-wide row cap from `timeframe.last_n_items`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    pub time_series: bool,
}

/// Compiles query descriptors into plans
#[derive(Clone)]
pub struct QueryPlanner {
    helpers: Arc<dyn Helpers>,
    default_interval: Interval,
}

impl QueryPlanner {
    pub fn new(helpers: Arc<dyn Helpers>) -> Self {
        Self {
            helpers,
            default_interval: Interval::Day,
        }
    }

    /// Interval used by date dimensions when the query names none
    pub fn with_default_interval(mut self, interval: Interval) -> Self {
        self.default_interval = interval;
        self
    }

    /// Compile a descriptor. No partial plan is returned on error.
    pub fn compile(&self, query: &QueryDescriptor) -> Result<QueryPlan, PlanError> {
        let (mut base, limit) = match &query.timeframe {
            Some(Timeframe::LastItems { last_n_items }) => (Clauses::default(), Some(*last_n_items)),
            Some(Timeframe::Range { start, end }) => (time_range_clauses(start, end), None),
            None => (Clauses::default(), None),
        };

        for filter in &query.filter {
            base = base.with_filter(filter);
        }

        let interval = query
            .interval
            .clone()
            .unwrap_or_else(|| self.default_interval.clone());

        let mut time_series = false;
        for dimension in &query.dimensions {
            base = match &dimension.datatype {
                DimensionType::Date => {
                    time_series = true;
                    base.with_projection(TIME_COLUMN, ProjectExpr::Time).with_grouping(
                        TIME_COLUMN,
                        GroupExpr::TimeBucket {
                            interval: interval.suffix().to_string(),
                        },
                    )
                }
                DimensionType::Ip | DimensionType::Number | DimensionType::String => {
                    let column = dimension.column().to_string();
                    base.with_projection(
                        &dimension.key,
                        ProjectExpr::Column {
                            column: column.clone(),
                        },
                    )
                    .with_grouping(&dimension.key, GroupExpr::Column { column })
                }
                DimensionType::Geo => {
                    tracing::debug!(dimension = %dimension.key, "Skipping unsupported geo dimension");
                    base
                }
                DimensionType::Unknown(datatype) => {
                    return Err(PlanError::UnknownDimensionType {
                        key: dimension.key.clone(),
                        datatype: datatype.clone(),
                    });
                }
            };
        }

        let placeholder = if query.metrics.is_empty() {
            query
                .collection
                .clone()
                .or_else(|| query.dimensions.first().and_then(|d| d.collection.clone()))
                .map(Metric::placeholder)
        } else {
            None
        };

        let mut col_queries: BTreeMap<String, ColQuery> = BTreeMap::new();
        for metric in query.metrics.iter().chain(placeholder.iter()) {
            let collection = match (&metric.collection, metric.is_executable()) {
                (Some(collection), true) => collection,
                _ => continue,
            };

            let clauses = metric
                .filter
                .iter()
                .fold(base.clone(), |clauses, filter| clauses.with_filter(filter));
            let key = self.col_query_key(collection, &clauses.matches)?;

            let merged = match col_queries.get(&key) {
                Some(existing) => extend_col_query(existing, &clauses, metric, limit),
                None => new_col_query(key.clone(), collection, clauses, metric, limit),
            };
            col_queries.insert(key, merged);
        }

        let plan = QueryPlan {
            uid: self.helpers.uuid(),
            cost: 0,
            col_queries,
            dimensions: query.dimensions.clone(),
            metrics: query.metrics.clone(),
            limit,
            time_series,
        };

        tracing::debug!(
            plan = %plan.uid,
            col_queries = plan.col_queries.len(),
            time_series = plan.time_series,
            "Compiled query plan"
        );

        Ok(plan)
    }

    fn col_query_key(
        &self,
        collection: &CollectionRef,
        matches: &MatchClause,
    ) -> Result<String, PlanError> {
        let serialized = serde_json::to_string(matches)?;
        Ok(self
            .helpers
            .hash(&format!("{}_{}", collection.key, serialized)))
    }
}

fn time_range_clauses(start: &Option<Value>, end: &Option<Value>) -> Clauses {
    let mut bounds = BTreeMap::new();
    for (operator, bound) in [(Operator::Gt, start), (Operator::Lt, end)] {
        let Some(bound) = bound else { continue };
        match parse_instant(bound) {
            Some(instant) => {
                bounds.insert(operator, Value::String(format_instant(&instant)));
            }
            None => tracing::warn!(bound = %bound, "Ignoring unparseable timeframe bound"),
        }
    }

    let mut clauses = Clauses::default();
    if !bounds.is_empty() {
        clauses.matches.insert(TIME_COLUMN.to_string(), bounds);
    }
    clauses
}

fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.format(TIME_LITERAL_FORMAT).to_string()
}

fn metric_projection(clauses: Clauses, metric: &Metric) -> Clauses {
    if metric.is_placeholder() {
        return clauses;
    }
    clauses.with_projection(
        &metric.key,
        ProjectExpr::Aggregate {
            aggregation: metric.aggregation.clone().unwrap_or_default(),
            attribute: metric.column().to_string(),
        },
    )
}

fn new_col_query(
    key: String,
    collection: &CollectionRef,
    clauses: Clauses,
    metric: &Metric,
    limit: Option<u64>,
) -> ColQuery {
    ColQuery {
        key,
        collection: collection.key.clone(),
        collections: collection.store_key().to_string(),
        query: metric_projection(clauses, metric).with_limit(limit),
        metrics: vec![metric.key.clone()],
    }
}

/// Copy `existing` with the metric's projection added. The existing group
/// clause is kept and existing projections are never overwritten by the
/// incoming base projections.
fn extend_col_query(
    existing: &ColQuery,
    clauses: &Clauses,
    metric: &Metric,
    limit: Option<u64>,
) -> ColQuery {
    let query = existing.query.clone().with_projections_from(clauses);
    let mut metrics = existing.metrics.clone();
    if !metrics.contains(&metric.key) {
        metrics.push(metric.key.clone());
    }
    ColQuery {
        query: metric_projection(query, metric).with_limit(limit),
        metrics,
        ..existing.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::DefaultHelpers;
    use crate::query::model::PLACEHOLDER_METRIC_KEY;
    use serde_json::json;
    use std::collections::HashSet;

    fn planner() -> QueryPlanner {
        QueryPlanner::new(DefaultHelpers::shared())
    }

    fn events() -> CollectionRef {
        CollectionRef::new("events").with_store_key("events")
    }

    fn sum_metric(key: &str, collection: CollectionRef) -> Metric {
        Metric::new(key)
            .aggregation(Aggregation::Sum)
            .attribute("count")
            .collection(collection)
    }

    fn only_col_query(plan: &QueryPlan) -> &ColQuery {
        assert_eq!(plan.col_queries.len(), 1);
        plan.col_queries.values().next().unwrap()
    }

    #[test]
    fn test_compile_single_metric() {
        let query = QueryDescriptor {
            dimensions: vec![Dimension::new("country", DimensionType::String)],
            metrics: vec![sum_metric("visits", events())],
            filter: vec![Filter::new("country", Operator::Eq, "US")],
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        let col_query = only_col_query(&plan);

        assert_eq!(col_query.collections, "events");
        assert_eq!(
            col_query.query.projection("visits"),
            Some(&ProjectExpr::Aggregate {
                aggregation: Aggregation::Sum,
                attribute: "count".to_string(),
            })
        );
        assert_eq!(col_query.query.group[0].key, "country");
        // eq is kept nested like every other operator
        assert_eq!(
            col_query.query.matches["country"].get(&Operator::Eq),
            Some(&json!("US"))
        );
        assert!(!plan.time_series);
        assert_eq!(plan.cost, 0);
    }

    #[test]
    fn test_same_collection_and_filter_merge() {
        let query = QueryDescriptor {
            dimensions: vec![Dimension::new("country", DimensionType::String)],
            metrics: vec![
                sum_metric("visits", events()),
                Metric::new("load")
                    .aggregation(Aggregation::parse("avg"))
                    .collection(events()),
            ],
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        let col_query = only_col_query(&plan);

        assert_eq!(col_query.metrics, vec!["visits", "load"]);
        let aliases: Vec<&str> = col_query.query.project.iter().map(|p| p.alias.as_str()).collect();
        assert_eq!(aliases, vec!["country", "visits", "load"]);
        assert_eq!(
            col_query.query.projection("load"),
            Some(&ProjectExpr::Aggregate {
                aggregation: Aggregation::Mean,
                attribute: "load".to_string(),
            })
        );
    }

    #[test]
    fn test_metric_filter_splits_sub_queries() {
        let query = QueryDescriptor {
            metrics: vec![
                sum_metric("visits", events()),
                sum_metric("us_visits", events()).filter(Filter::new("country", Operator::Eq, "US")),
                sum_metric("us_visits_2", events()).filter(Filter::new("country", Operator::Eq, "US")),
            ],
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        assert_eq!(plan.col_queries.len(), 2);

        let filtered = plan
            .col_queries
            .values()
            .find(|c| c.query.matches.contains_key("country"))
            .unwrap();
        assert_eq!(filtered.metrics, vec!["us_visits", "us_visits_2"]);
    }

    #[test]
    fn test_col_query_count_matches_distinct_pairs() {
        let pages = CollectionRef::new("pages");
        let metrics = vec![
            sum_metric("a", events()),
            sum_metric("b", events()),
            sum_metric("c", pages.clone()),
            sum_metric("d", pages.clone()).filter(Filter::new("path", Operator::Eq, "/")),
            sum_metric("e", pages).filter(Filter::new("path", Operator::Eq, "/")),
            Metric::new("f").formula(json!("a / b")),
            Metric::new("g"),
        ];
        let query = QueryDescriptor {
            metrics: metrics.clone(),
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();

        let distinct: HashSet<(String, Vec<(String, String)>)> = metrics
            .iter()
            .filter(|m| m.is_executable())
            .map(|m| {
                let filters = m
                    .filter
                    .iter()
                    .map(|f| (f.field.clone(), f.value.to_string()))
                    .collect();
                (m.collection.as_ref().unwrap().key.clone(), filters)
            })
            .collect();
        assert_eq!(plan.col_queries.len(), distinct.len());
        assert_eq!(plan.col_queries.len(), 3);
    }

    #[test]
    fn test_formula_and_collectionless_metrics_excluded() {
        let query = QueryDescriptor {
            metrics: vec![
                Metric::new("ratio").collection(events()).formula(json!("a / b")),
                Metric::new("orphan"),
            ],
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        assert!(plan.col_queries.is_empty());
        // Still echoed for downstream formula evaluation
        assert_eq!(plan.metrics.len(), 2);
    }

    #[test]
    fn test_placeholder_metric_for_grouping_only_query() {
        let query = QueryDescriptor {
            dimensions: vec![Dimension::new("country", DimensionType::String)],
            collection: Some(events()),
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        let col_query = only_col_query(&plan);

        assert_eq!(col_query.metrics, vec![PLACEHOLDER_METRIC_KEY]);
        // Placeholder contributes no projection of its own
        assert_eq!(col_query.query.project.len(), 1);
        assert!(col_query.query.projection(PLACEHOLDER_METRIC_KEY).is_none());
        assert!(plan.metrics.is_empty());
    }

    #[test]
    fn test_placeholder_uses_dimension_collection() {
        let query = QueryDescriptor {
            dimensions: vec![
                Dimension::new("country", DimensionType::String).collection(CollectionRef::new("visits"))
            ],
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        assert_eq!(only_col_query(&plan).collections, "visits");
    }

    #[test]
    fn test_placeholder_only_consults_first_dimension() {
        let query = QueryDescriptor {
            dimensions: vec![
                Dimension::new("country", DimensionType::String),
                Dimension::new("browser", DimensionType::String).collection(CollectionRef::new("visits")),
            ],
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        assert!(plan.col_queries.is_empty());
    }

    #[test]
    fn test_declared_metric_named_like_placeholder_is_projected() {
        let query = QueryDescriptor {
            dimensions: vec![Dimension::new("country", DimensionType::String)],
            metrics: vec![Metric::new(PLACEHOLDER_METRIC_KEY)
                .aggregation(Aggregation::Sum)
                .collection(events())],
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        let col_query = only_col_query(&plan);

        assert_eq!(
            col_query.query.projection(PLACEHOLDER_METRIC_KEY),
            Some(&ProjectExpr::Aggregate {
                aggregation: Aggregation::Sum,
                attribute: PLACEHOLDER_METRIC_KEY.to_string(),
            })
        );
    }

    #[test]
    fn test_no_resolvable_collection_yields_empty_plan() {
        let query = QueryDescriptor {
            dimensions: vec![Dimension::new("country", DimensionType::String)],
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        assert!(plan.col_queries.is_empty());
    }

    #[test]
    fn test_last_n_items_sets_limit_without_time_match() {
        let query = QueryDescriptor {
            metrics: vec![sum_metric("visits", events())],
            timeframe: Some(Timeframe::LastItems { last_n_items: 5 }),
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        let col_query = only_col_query(&plan);

        assert_eq!(plan.limit, Some(5));
        assert_eq!(col_query.query.limit, Some(5));
        assert!(!col_query.query.matches.contains_key(TIME_COLUMN));
    }

    #[test]
    fn test_time_range_match_is_exclusive() {
        let query = QueryDescriptor {
            metrics: vec![sum_metric("visits", events())],
            timeframe: Some(Timeframe::Range {
                start: Some(json!("2024-01-01T00:00:00Z")),
                end: Some(json!("2024-01-31 12:30:00")),
            }),
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        let time = &only_col_query(&plan).query.matches[TIME_COLUMN];

        assert_eq!(time.get(&Operator::Gt), Some(&json!("2024-01-01 00:00:00.000")));
        assert_eq!(time.get(&Operator::Lt), Some(&json!("2024-01-31 12:30:00.000")));
        assert_eq!(plan.limit, None);
    }

    #[test]
    fn test_unparseable_bound_is_dropped() {
        let query = QueryDescriptor {
            metrics: vec![sum_metric("visits", events())],
            timeframe: Some(Timeframe::Range {
                start: Some(json!("not a date")),
                end: Some(json!("2024-01-31")),
            }),
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        let time = &only_col_query(&plan).query.matches[TIME_COLUMN];
        assert!(time.get(&Operator::Gt).is_none());
        assert!(time.get(&Operator::Lt).is_some());
    }

    #[test]
    fn test_unknown_dimension_type_fails() {
        let query = QueryDescriptor {
            dimensions: vec![
                Dimension::new("country", DimensionType::String),
                Dimension::new("place", DimensionType::parse("unsupported")),
            ],
            metrics: vec![sum_metric("visits", events())],
            ..Default::default()
        };

        let err = planner().compile(&query).unwrap_err();
        assert!(matches!(err, PlanError::UnknownDimensionType { .. }));
        let message = err.to_string();
        assert!(message.contains("place"));
        assert!(message.contains("unsupported"));
    }

    #[test]
    fn test_date_dimension_buckets_time() {
        let query = QueryDescriptor {
            dimensions: vec![Dimension::new("timestamp", DimensionType::Date)],
            metrics: vec![sum_metric("visits", events())],
            interval: Some(Interval::parse("timebucket.hour")),
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        let col_query = only_col_query(&plan);

        assert!(plan.time_series);
        assert_eq!(col_query.query.projection(TIME_COLUMN), Some(&ProjectExpr::Time));
        assert_eq!(
            col_query.query.group[0].expr,
            GroupExpr::TimeBucket {
                interval: "h".to_string()
            }
        );
    }

    #[test]
    fn test_default_interval_applies() {
        let query = QueryDescriptor {
            dimensions: vec![Dimension::new("timestamp", DimensionType::Date)],
            metrics: vec![sum_metric("visits", events())],
            ..Default::default()
        };

        let plan = planner()
            .with_default_interval(Interval::Minute)
            .compile(&query)
            .unwrap();
        assert_eq!(
            only_col_query(&plan).query.group[0].expr,
            GroupExpr::TimeBucket {
                interval: "m".to_string()
            }
        );
    }

    #[test]
    fn test_geo_dimension_is_skipped() {
        let query = QueryDescriptor {
            dimensions: vec![
                Dimension::new("location", DimensionType::Geo),
                Dimension::new("ip", DimensionType::Ip).attribute("client.ip"),
            ],
            metrics: vec![sum_metric("visits", events())],
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        let col_query = only_col_query(&plan);

        assert!(col_query.query.projection("location").is_none());
        assert_eq!(
            col_query.query.projection("ip"),
            Some(&ProjectExpr::Column {
                column: "client.ip".to_string()
            })
        );
    }

    #[test]
    fn test_default_aggregation_is_sum() {
        let query = QueryDescriptor {
            metrics: vec![Metric::new("visits").collection(events())],
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        assert_eq!(
            only_col_query(&plan).query.projection("visits"),
            Some(&ProjectExpr::Aggregate {
                aggregation: Aggregation::Sum,
                attribute: "visits".to_string(),
            })
        );
    }

    #[test]
    fn test_filters_on_same_field_accumulate() {
        let query = QueryDescriptor {
            metrics: vec![sum_metric("visits", events())],
            filter: vec![
                Filter::new("duration", Operator::Gte, 10),
                Filter::new("duration", Operator::Lt, 60),
            ],
            ..Default::default()
        };

        let plan = planner().compile(&query).unwrap();
        let duration = &only_col_query(&plan).query.matches["duration"];
        assert_eq!(duration.len(), 2);
    }

    #[test]
    fn test_compiled_key_is_stable() {
        let query = QueryDescriptor {
            metrics: vec![sum_metric("visits", events())],
            filter: vec![Filter::new("country", Operator::Eq, "US")],
            ..Default::default()
        };

        let first = planner().compile(&query).unwrap();
        let second = planner().compile(&query).unwrap();
        assert_eq!(
            first.col_queries.keys().collect::<Vec<_>>(),
            second.col_queries.keys().collect::<Vec<_>>()
        );
        assert_ne!(first.uid, second.uid);
    }
}
