//! InfluxDB line protocol encoding
//!
//! ```text
//! measurement,tag=value field=1i,other=0.5 1704067200000
//! ```

use crate::store::types::{FieldValue, Point};

/// Encode a point as one line
pub fn encode_point(point: &Point) -> String {
    let mut line = escape(&point.measurement, &[',', ' ']);

    for (key, value) in &point.tags {
        if value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&escape(key, &[',', '=', ' ']));
        line.push('=');
        line.push_str(&escape(value, &[',', '=', ' ']));
    }

    let fields = point
        .fields
        .iter()
        .map(|(key, value)| format!("{}={}", escape(key, &[',', '=', ' ']), encode_field(value)))
        .collect::<Vec<_>>()
        .join(",");

    line.push(' ');
    line.push_str(&fields);
    line.push(' ');
    line.push_str(&point.timestamp_ms.to_string());
    line
}

/// Encode a batch, one point per line
pub fn encode_points(points: &[Point]) -> String {
    points.iter().map(encode_point).collect::<Vec<_>>().join("\n")
}

fn encode_field(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(f) => f.to_string(),
        FieldValue::Integer(i) => format!("{}i", i),
        FieldValue::Boolean(b) => b.to_string(),
        FieldValue::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
    }
}

fn escape(s: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
