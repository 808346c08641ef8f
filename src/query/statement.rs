//! Statement Generator
//!
//! Renders a [`ColQuery`] into InfluxQL text:
//!
//! ```text
//! select <projection> from <collection> [group by <group> [fill(0)]] [where <predicates>]
//! ```
//!
//! A row cap is never rendered as `limit`; each projection is wrapped in
//! `top(<column>, N)` instead so ranking stays per group, and the group clause
//! is dropped.

use serde_json::Value;

use crate::query::plan::{ColQuery, GroupExpr, ProjectExpr, Projection, TIME_COLUMN};

/// Renders sub-queries into statements
#[derive(Debug, Clone, Copy)]
pub struct StatementRenderer {
    /// Append `fill(0)` to grouped statements
    pub fill_zero: bool,
}

impl Default for StatementRenderer {
    fn default() -> Self {
        Self { fill_zero: true }
    }
}

impl StatementRenderer {
    pub fn new(fill_zero: bool) -> Self {
        Self { fill_zero }
    }

    pub fn render(&self, col_query: &ColQuery) -> String {
        let clauses = &col_query.query;

        let projection = if clauses.project.is_empty() {
            "*".to_string()
        } else {
            clauses
                .project
                .iter()
                .map(|p| render_projection(p, clauses.limit))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!(
            "select {} from {}",
            projection,
            quote_ident(&col_query.collections)
        );

        if clauses.limit.is_none() && !clauses.group.is_empty() {
            let group = clauses
                .group
                .iter()
                .map(|g| match &g.expr {
                    GroupExpr::Column { column } => quote_ident(column),
                    GroupExpr::TimeBucket { interval } => format!("time(1{})", interval),
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" group by ");
            sql.push_str(&group);
            if self.fill_zero {
                sql.push_str(" fill(0)");
            }
        }

        let predicates: Vec<String> = clauses
            .matches
            .iter()
            .flat_map(|(field, conditions)| {
                conditions.iter().map(move |(operator, value)| {
                    format!("{} {} {}", quote_ident(field), operator.token(), literal(value))
                })
            })
            .collect();
        if !predicates.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&predicates.join(" and "));
        }

        sql
    }
}

/// Render with default options
pub fn render(col_query: &ColQuery) -> String {
    StatementRenderer::default().render(col_query)
}

fn render_projection(projection: &Projection, limit: Option<u64>) -> String {
    let alias = quote_ident(&projection.alias);
    match (&projection.expr, limit) {
        (ProjectExpr::Time, _) => TIME_COLUMN.to_string(),
        (ProjectExpr::Column { column }, None) => {
            if *column == projection.alias {
                alias
            } else {
                format!("{} as {}", quote_ident(column), alias)
            }
        }
        (ProjectExpr::Column { column }, Some(n)) => {
            format!("top({}, {}) as {}", quote_ident(column), n, alias)
        }
        (ProjectExpr::Aggregate { aggregation, attribute }, None) => {
            format!("{} as {}", aggregation.apply_to(&quote_ident(attribute)), alias)
        }
        (ProjectExpr::Aggregate { attribute, .. }, Some(n)) => {
            format!("top({}, {}) as {}", quote_ident(attribute), n, alias)
        }
    }
}

/// Quote an identifier unless it is a plain word
pub fn quote_ident(ident: &str) -> String {
    let mut chars = ident.chars();
    let plain = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        ident.to_string()
    } else {
        format!("\"{}\"", ident.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => quote_str(s),
        other => quote_str(&other.to_string()),
    }
}

fn quote_str(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}
