//! Query Descriptor Model
//!
//! Declarative description of an analytical query: dimensions to group by,
//! metrics to aggregate, filters, a timeframe and a time-bucket interval.
//!
//! The closed enumerations here ([`Operator`], [`Aggregation`], [`Interval`],
//! [`DimensionType`]) carry the mapping tables from descriptor tokens to
//! InfluxQL tokens.
//!
//! # Example Descriptor
//!
//! ```text
//! {
//!   "dimensions": [{"key": "country", "datatype": "string"}],
//!   "metrics": [{"key": "visits", "aggregation": "sum", "attribute": "count",
//!                "collection": {"key": "events", "storeKey": "events"}}],
//!   "filter": [["country", "eq", "US"]],
//!   "timeframe": {"start": "2024-01-01", "end": "2024-02-01"},
//!   "interval": "timebucket.day"
//! }
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key of the metric synthesized for grouping-only queries
pub const PLACEHOLDER_METRIC_KEY: &str = "fake";

/// Comparison operators accepted in filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Equal to
    #[serde(alias = "$eq")]
    Eq,
    /// Greater than
    #[serde(alias = "$gt")]
    Gt,
    /// Greater than or equal to
    #[serde(alias = "$gte")]
    Gte,
    /// Less than
    #[serde(alias = "$lt")]
    Lt,
    /// Less than or equal to
    #[serde(alias = "$lte")]
    Lte,
}

impl Operator {
    /// Parse from a descriptor token (`eq`, `$gt`, ...)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_start_matches('$') {
            "eq" => Some(Self::Eq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    /// InfluxQL comparison token
    pub fn token(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Aggregation applied to a metric's attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Aggregation {
    Sum,
    Mean,
    Count,
    /// Count of distinct values (`ucount`)
    DistinctCount,
    Min,
    Max,
    First,
    Last,
    Median,
    /// Unrecognized function name, passed through to the store verbatim
    Other(String),
}

impl Aggregation {
    /// Parse from a descriptor token, translating `avg` and `ucount`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "sum" => Self::Sum,
            "avg" | "average" | "mean" => Self::Mean,
            "count" => Self::Count,
            "ucount" | "distinct" => Self::DistinctCount,
            "min" => Self::Min,
            "max" => Self::Max,
            "first" => Self::First,
            "last" => Self::Last,
            "median" => Self::Median,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Store function name
    pub fn name(&self) -> &str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Count => "count",
            Self::DistinctCount => "distinct",
            Self::Min => "min",
            Self::Max => "max",
            Self::First => "first",
            Self::Last => "last",
            Self::Median => "median",
            Self::Other(name) => name,
        }
    }

    /// Aggregation expression over an already-quoted column
    pub fn apply_to(&self, column: &str) -> String {
        match self {
            Self::DistinctCount => format!("count(distinct({}))", column),
            _ => format!("{}({})", self.name(), column),
        }
    }
}

impl Default for Aggregation {
    fn default() -> Self {
        Self::Sum
    }
}

impl From<String> for Aggregation {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Aggregation> for String {
    fn from(agg: Aggregation) -> Self {
        agg.name().to_string()
    }
}

/// Time-bucket granularity for date dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Interval {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    /// Unknown token, used as the bucket suffix unchanged
    Raw(String),
}

impl Interval {
    /// Parse a `timebucket.*` token
    pub fn parse(s: &str) -> Self {
        match s {
            "timebucket.second" => Self::Second,
            "timebucket.minute" => Self::Minute,
            "timebucket.hour" => Self::Hour,
            "timebucket.day" => Self::Day,
            "timebucket.week" => Self::Week,
            other => Self::Raw(other.to_string()),
        }
    }

    /// Store time-bucket suffix (`s/m/h/d/w`)
    pub fn suffix(&self) -> &str {
        match self {
            Self::Second => "s",
            Self::Minute => "m",
            Self::Hour => "h",
            Self::Day => "d",
            Self::Week => "w",
            Self::Raw(raw) => raw,
        }
    }

    /// Descriptor token
    pub fn token(&self) -> &str {
        match self {
            Self::Second => "timebucket.second",
            Self::Minute => "timebucket.minute",
            Self::Hour => "timebucket.hour",
            Self::Day => "timebucket.day",
            Self::Week => "timebucket.week",
            Self::Raw(raw) => raw,
        }
    }
}

impl From<String> for Interval {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.token().to_string()
    }
}

/// Datatype of a dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DimensionType {
    Date,
    Ip,
    Number,
    String,
    Geo,
    /// Rejected by the planner
    Unknown(String),
}

impl DimensionType {
    pub fn parse(s: &str) -> Self {
        match s {
            "date" => Self::Date,
            "ip" => Self::Ip,
            "number" => Self::Number,
            "string" => Self::String,
            "geo" => Self::Geo,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Date => "date",
            Self::Ip => "ip",
            Self::Number => "number",
            Self::String => "string",
            Self::Geo => "geo",
            Self::Unknown(other) => other,
        }
    }
}

impl From<String> for DimensionType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<DimensionType> for String {
    fn from(datatype: DimensionType) -> Self {
        datatype.as_str().to_string()
    }
}

impl std::fmt::Display for DimensionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `[field, operator, value]` filter entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, Operator, Value)", into = "(String, Operator, Value)")]
pub struct Filter {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

impl From<(String, Operator, Value)> for Filter {
    fn from((field, operator, value): (String, Operator, Value)) -> Self {
        Self {
            field,
            operator,
            value,
        }
    }
}

impl From<Filter> for (String, Operator, Value) {
    fn from(filter: Filter) -> Self {
        (filter.field, filter.operator, filter.value)
    }
}

/// Reference to a source collection (a measurement in the store)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRef {
    /// Logical collection key
    pub key: String,
    /// Physical measurement name, defaults to `key`
    #[serde(rename = "storeKey", default, skip_serializing_if = "Option::is_none")]
    pub store_key: Option<String>,
}

impl CollectionRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            store_key: None,
        }
    }

    pub fn with_store_key(mut self, store_key: impl Into<String>) -> Self {
        self.store_key = Some(store_key.into());
        self
    }

    /// Physical measurement name
    pub fn store_key(&self) -> &str {
        self.store_key.as_deref().unwrap_or(&self.key)
    }
}

/// A grouping axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub key: String,
    pub datatype: DimensionType,
    /// Source column override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionRef>,
}

impl Dimension {
    pub fn new(key: impl Into<String>, datatype: DimensionType) -> Self {
        Self {
            key: key.into(),
            datatype,
            attribute: None,
            collection: None,
        }
    }

    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn collection(mut self, collection: CollectionRef) -> Self {
        self.collection = Some(collection);
        self
    }

    /// Source column (attribute override or key)
    pub fn column(&self) -> &str {
        self.attribute.as_deref().unwrap_or(&self.key)
    }
}

/// A requested aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Filter>,
    /// Derived metric definition, evaluated downstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<Value>,
    /// Set only on the planner's grouping stand-in, never by a descriptor
    #[serde(skip)]
    placeholder: bool,
}

impl Metric {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            aggregation: None,
            attribute: None,
            collection: None,
            filter: Vec::new(),
            formula: None,
            placeholder: false,
        }
    }

    /// Grouping-only stand-in bound to `collection`
    pub fn placeholder(collection: CollectionRef) -> Self {
        Self {
            placeholder: true,
            ..Self::new(PLACEHOLDER_METRIC_KEY).collection(collection)
        }
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn collection(mut self, collection: CollectionRef) -> Self {
        self.collection = Some(collection);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter.push(filter);
        self
    }

    pub fn formula(mut self, formula: Value) -> Self {
        self.formula = Some(formula);
        self
    }

    /// Source column (attribute override or key)
    pub fn column(&self) -> &str {
        self.attribute.as_deref().unwrap_or(&self.key)
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Whether the metric produces a sub-query
    pub fn is_executable(&self) -> bool {
        self.collection.is_some() && self.formula.is_none()
    }
}

/// Query time bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timeframe {
    /// Row-count cap
    LastItems { last_n_items: u64 },
    /// Absolute range; bounds are timestamps, strings or epoch milliseconds
    Range {
        #[serde(default)]
        start: Option<Value>,
        #[serde(default)]
        end: Option<Value>,
    },
}

/// Declarative analytical query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub filter: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<Interval>,
    /// Collection for grouping-only queries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionRef>,
}

/// Parse a timeframe bound into an instant.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]`, `YYYY-MM-DD`, and epoch
/// milliseconds (as a number or numeric string).
pub fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::String(s) => parse_instant_str(s),
        _ => None,
    }
}

fn parse_instant_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    s.parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}
