//! InfluxDB HTTP API Client
//!
//! Talks to the InfluxDB 1.x `/query`, `/write` and `/ping` endpoints.
//! Times are requested as epoch milliseconds.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;

use crate::store::error::{StoreError, StoreResult};
use crate::store::line_protocol::encode_points;
use crate::store::types::{Point, RawResult, Series};
use crate::store::SeriesStore;

/// Connection settings for an InfluxDB server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InfluxConfig {
    /// Base URL (e.g., "http://localhost:8086")
    pub url: String,
    /// Database holding the collections
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            database: "analytics".to_string(),
            username: None,
            password: None,
            request_timeout_ms: 30_000,
        }
    }
}

/// InfluxDB REST client
pub struct InfluxClient {
    client: Client,
    config: InfluxConfig,
}

impl InfluxClient {
    pub fn new(config: InfluxConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &InfluxConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(username) => request.basic_auth(username, self.config.password.as_ref()),
            None => request,
        }
    }
}

#[async_trait]
impl SeriesStore for InfluxClient {
    fn name(&self) -> &str {
        "influxDB"
    }

    fn database(&self) -> &str {
        &self.config.database
    }

    async fn ping(&self) -> StoreResult<()> {
        let response = self
            .authed(self.client.get(self.endpoint("ping")))
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }

    async fn query(&self, statement: &str) -> StoreResult<RawResult> {
        let params = [
            ("db", self.config.database.as_str()),
            ("q", statement),
            ("epoch", "ms"),
        ];
        // Only read statements may use GET
        let request = if is_read_statement(statement) {
            self.client.get(self.endpoint("query")).query(&params)
        } else {
            self.client.post(self.endpoint("query")).query(&params)
        };

        let response = self
            .authed(request)
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(StoreError::from_transport)?;

        if !status.is_success() {
            if let Ok(body) = serde_json::from_str::<QueryResponseBody>(&text) {
                if let Some(error) = body.error {
                    return Err(StoreError::Statement(error));
                }
            }
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        parse_query_response(&text)
    }

    async fn write_points(&self, points: &[Point]) -> StoreResult<()> {
        if points.is_empty() {
            return Ok(());
        }

        let response = self
            .authed(
                self.client
                    .post(self.endpoint("write"))
                    .query(&[("db", self.config.database.as_str()), ("precision", "ms")])
                    .body(encode_points(points)),
            )
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(StoreError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}

fn is_read_statement(statement: &str) -> bool {
    let head = statement.trim_start().to_lowercase();
    head.starts_with("select") || head.starts_with("show")
}

// ============================================
// Response DTOs
// ============================================

#[derive(Debug, Deserialize)]
struct QueryResponseBody {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<Series>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode a `/query` response body
pub fn parse_query_response(body: &str) -> StoreResult<RawResult> {
    let body: QueryResponseBody =
        serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))?;

    if let Some(error) = body.error {
        return Err(StoreError::Statement(error));
    }

    let mut series = Vec::new();
    for result in body.results {
        if let Some(error) = result.error {
            return Err(StoreError::Statement(error));
        }
        series.extend(result.series);
    }

    Ok(RawResult::new(series))
}
