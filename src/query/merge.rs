//! Result Merger
//!
//! Pivots the independent result sets of a plan's sub-queries into one row
//! per distinct dimension tuple.
//!
//! Each data row is keyed by the hash of its canonical `_id` (the declared
//! dimension values, serialized with sorted field names). The first row seen
//! for a key creates the output row; later rows, from any sub-query, fill in
//! the columns they carry. Once every result set is folded in, each requested
//! metric missing from a row is set to null so the output is rectangular.

use chrono::{SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::helpers::Helpers;
use crate::query::model::{Dimension, DimensionType, Metric};
use crate::query::plan::{QueryPlan, TIME_COLUMN};
use crate::store::RawResult;

/// Logical name of the store's time column
pub const TIMESTAMP_FIELD: &str = "timestamp";
/// Dimension tuple of an output row
pub const ID_FIELD: &str = "_id";
/// Merge key of an output row
pub const KEY_FIELD: &str = "key";
/// Placeholder for a dimension a row did not carry
pub const NOT_SET: &str = "(not set)";

/// Merged, rectangular result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedResult {
    pub dimensions: Vec<Dimension>,
    pub metrics: Vec<Metric>,
    pub documents: Vec<Map<String, Value>>,
    /// Rows that could not be fully keyed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<String>,
}

/// Where a dimension's value comes from in a normalized row
struct DimensionSource {
    key: String,
    /// Candidate columns, first present wins
    columns: Vec<String>,
}

/// Incremental pivot over raw result sets
pub struct ResultMerger {
    helpers: Arc<dyn Helpers>,
    dimensions: Vec<Dimension>,
    metrics: Vec<Metric>,
    sources: Vec<DimensionSource>,
    rows: Vec<Map<String, Value>>,
    index: HashMap<String, usize>,
    anomalies: Vec<String>,
}

impl ResultMerger {
    pub fn new(helpers: Arc<dyn Helpers>, dimensions: Vec<Dimension>, metrics: Vec<Metric>) -> Self {
        let sources = dimensions
            .iter()
            .filter_map(|dimension| {
                let key = normalize_column(&dimension.key);
                match dimension.datatype {
                    DimensionType::Date => Some(DimensionSource {
                        key,
                        columns: vec![TIMESTAMP_FIELD.to_string()],
                    }),
                    DimensionType::Geo | DimensionType::Unknown(_) => None,
                    _ => {
                        // Grouped series carry the attribute as a tag, plain
                        // rows carry the aliased projection
                        let mut columns = vec![normalize_column(dimension.column())];
                        if columns[0] != key {
                            columns.push(key.clone());
                        }
                        Some(DimensionSource { key, columns })
                    }
                }
            })
            .collect();

        Self {
            helpers,
            dimensions,
            metrics,
            sources,
            rows: Vec::new(),
            index: HashMap::new(),
            anomalies: Vec::new(),
        }
    }

    /// Merger for the declared dimensions and metrics of a plan
    pub fn for_plan(helpers: Arc<dyn Helpers>, plan: &QueryPlan) -> Self {
        Self::new(helpers, plan.dimensions.clone(), plan.metrics.clone())
    }

    /// Fold one sub-query's result set into the output rows
    pub fn fold(&mut self, col_query_key: &str, raw: &RawResult) {
        if raw.is_empty() {
            tracing::debug!(col_query = %col_query_key, "Sub-query returned no rows");
            return;
        }

        for series in &raw.series {
            for row in series.rows() {
                self.fold_row(col_query_key, normalize_row(row));
            }
        }
    }

    fn fold_row(&mut self, col_query_key: &str, row: Map<String, Value>) {
        let mut id = BTreeMap::new();
        for source in &self.sources {
            let value = match source.columns.iter().find_map(|column| row.get(column)) {
                Some(value) => value.clone(),
                None => {
                    tracing::warn!(
                        col_query = %col_query_key,
                        dimension = %source.key,
                        "Result row is missing a dimension column"
                    );
                    self.anomalies.push(format!(
                        "sub-query {} returned a row without dimension [{}]",
                        col_query_key, source.key
                    ));
                    Value::String(NOT_SET.to_string())
                }
            };
            id.insert(source.key.clone(), value);
        }

        let id = Value::Object(id.into_iter().collect());
        let hash = self.helpers.hash(&id.to_string());

        let position = match self.index.get(&hash) {
            Some(&position) => position,
            None => {
                let mut output = Map::new();
                if let Value::Object(fields) = &id {
                    for (key, value) in fields {
                        output.insert(key.clone(), value.clone());
                    }
                }
                output.insert(ID_FIELD.to_string(), id.clone());
                output.insert(KEY_FIELD.to_string(), Value::String(hash.clone()));
                self.rows.push(output);
                self.index.insert(hash, self.rows.len() - 1);
                self.rows.len() - 1
            }
        };

        let output = &mut self.rows[position];
        for (column, value) in row {
            if self.sources.iter().any(|s| s.key == column) {
                continue;
            }
            output.insert(column, value);
        }
    }

    /// Null-fill missing metrics and return the merged result
    pub fn finish(self) -> MergedResult {
        let metric_keys: Vec<String> = self
            .metrics
            .iter()
            .filter(|m| !m.is_placeholder())
            .map(|m| normalize_column(&m.key))
            .collect();

        let documents = self
            .rows
            .into_iter()
            .map(|mut row| {
                for key in &metric_keys {
                    row.entry(key.clone()).or_insert(Value::Null);
                }
                row
            })
            .collect();

        MergedResult {
            dimensions: self.dimensions,
            metrics: self.metrics,
            documents,
            anomalies: self.anomalies,
        }
    }
}

/// Merge every raw result of a plan, in plan order
pub fn merge(helpers: Arc<dyn Helpers>, plan: &QueryPlan, results: &BTreeMap<String, RawResult>) -> MergedResult {
    let mut merger = ResultMerger::for_plan(helpers, plan);
    for key in plan.col_queries.keys() {
        if let Some(raw) = results.get(key) {
            merger.fold(key, raw);
        }
    }
    merger.finish()
}

/// `.` → `_`, matching how flattened documents are stored
pub fn normalize_column(column: &str) -> String {
    column.replace('.', "_")
}

fn normalize_row(row: Map<String, Value>) -> Map<String, Value> {
    row.into_iter()
        .map(|(column, value)| {
            if column == TIME_COLUMN {
                (TIMESTAMP_FIELD.to_string(), normalize_time(value))
            } else {
                (normalize_column(&column), value)
            }
        })
        .collect()
}

/// Epoch milliseconds (number or numeric string) → RFC 3339 when positive
fn normalize_time(value: Value) -> Value {
    let millis = match &value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => match s.parse::<i64>() {
            Ok(parsed) => Some(parsed),
            Err(_) => return value,
        },
        _ => None,
    };

    match millis {
        Some(ms) if ms > 0 => match Utc.timestamp_millis_opt(ms).single() {
            Some(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => value,
        },
        Some(ms) => Value::from(ms),
        None => value,
    }
}
