//! Store wire types
//!
//! [`RawResult`] mirrors the series layout InfluxDB returns for a statement;
//! [`Point`] is one row handed to the write endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::store::error::{StoreError, StoreResult};

/// One series of a statement result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub name: String,
    /// Group-by tag values shared by every row of the series
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, Value>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl Series {
    pub fn new(name: impl Into<String>, columns: &[&str], values: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            values,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Rows as column → value objects, tags included
    pub fn rows(&self) -> impl Iterator<Item = Map<String, Value>> + '_ {
        self.values.iter().map(move |values| {
            let mut row: Map<String, Value> = self
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            for (column, value) in self.columns.iter().zip(values.iter()) {
                row.insert(column.clone(), value.clone());
            }
            row
        })
    }
}

/// Raw result of one statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub series: Vec<Series>,
}

impl RawResult {
    pub fn new(series: Vec<Series>) -> Self {
        Self { series }
    }

    /// Whether no series carries any row
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.values.is_empty())
    }

    pub fn row_count(&self) -> usize {
        self.series.iter().map(|s| s.values.len()).sum()
    }
}

/// A field value in line protocol
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
}

/// A single point to write
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    /// Unix timestamp in milliseconds
    pub timestamp_ms: i64,
}

impl Point {
    /// Build a point from a flattened document.
    ///
    /// String values become tags, numbers and booleans become fields, nulls
    /// are skipped. A point needs at least one field.
    pub fn from_flat(
        measurement: impl Into<String>,
        document: &Map<String, Value>,
        timestamp_ms: i64,
    ) -> StoreResult<Self> {
        let measurement = measurement.into();
        let mut tags = BTreeMap::new();
        let mut fields = BTreeMap::new();

        for (key, value) in document {
            match value {
                Value::String(s) => {
                    tags.insert(key.clone(), s.clone());
                }
                Value::Bool(b) => {
                    fields.insert(key.clone(), FieldValue::Boolean(*b));
                }
                Value::Number(n) => {
                    let field = match n.as_i64() {
                        Some(i) => FieldValue::Integer(i),
                        None => FieldValue::Float(n.as_f64().unwrap_or_default()),
                    };
                    fields.insert(key.clone(), field);
                }
                Value::Null => {}
                other => {
                    fields.insert(key.clone(), FieldValue::String(other.to_string()));
                }
            }
        }

        if fields.is_empty() {
            return Err(StoreError::InvalidPoint(format!(
                "document for [{}] has no numeric or boolean fields",
                measurement
            )));
        }

        Ok(Self {
            measurement,
            tags,
            fields,
            timestamp_ms,
        })
    }
}
