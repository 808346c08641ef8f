//! Provider REST API
//!
//! HTTP API layer over the [`InfluxProvider`](crate::provider::InfluxProvider),
//! built with Axum.
//!
//! # Endpoints
//!
//! ## Query
//! - `POST /api/v1/query` - Execute a query descriptor
//! - `POST /api/v1/plan` - Compile a descriptor and render its statements
//!
//! ## Collections
//! - `POST /api/v1/collections/:key/documents` - Insert documents
//! - `GET /api/v1/collections/:key/stats` - Point counts
//! - `DELETE /api/v1/collections/:key` - Drop a collection
//! - `DELETE /api/v1/database?confirm=true` - Drop the database
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! Callers may pass `x-request-id`; it is carried into the query log span.
//!
//! # Example
//!
//! ```rust,ignore
//! use influx_provider::api::{serve, AppState};
//! use influx_provider::{Config, DefaultHelpers, InfluxProvider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let provider = Arc::new(InfluxProvider::open(&config, DefaultHelpers::shared())?);
//!
//!     let state = AppState::new(provider, config.api.clone());
//!     serve(state, &config.api).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use crate::config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Maximum insert body size
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Query routes
        .route("/query", post(routes::query::execute_query))
        .route("/plan", post(routes::query::plan_query))
        // Collection routes
        .route(
            "/collections/:key/documents",
            post(routes::collections::insert_documents),
        )
        .route(
            "/collections/:key/stats",
            get(routes::collections::collection_stats),
        )
        .route("/collections/:key", delete(routes::collections::drop_collection))
        .route("/database", delete(routes::collections::purge_database))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let provider = Arc::clone(&state.provider);
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Influx provider API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    provider.close().await;
    tracing::info!("Influx provider API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryConfig;
    use crate::helpers::DefaultHelpers;
    use crate::provider::InfluxProvider;
    use crate::store::mock::MockStore;
    use crate::store::{RawResult, Series};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn create_test_app(store: Arc<MockStore>) -> (Router, Arc<InfluxProvider>) {
        let provider = Arc::new(InfluxProvider::with_store(
            store,
            DefaultHelpers::shared(),
            &QueryConfig::default(),
        ));
        let state = AppState::new(Arc::clone(&provider), ApiConfig::default());
        (build_router(state), provider)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn visits_query() -> Value {
        json!({
            "dimensions": [{"key": "country", "datatype": "string"}],
            "metrics": [{
                "key": "visits",
                "aggregation": "sum",
                "collection": {"key": "events"}
            }]
        })
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _) = create_test_app(Arc::new(MockStore::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_follows_connection() {
        let (app, provider) = create_test_app(Arc::new(MockStore::new()));

        let ready = |app: Router| async move {
            app.oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
        };

        assert_eq!(ready(app.clone()).await, StatusCode::OK);
        provider.close().await;
        assert_eq!(ready(app).await, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, _) = create_test_app(Arc::new(MockStore::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"], "ok");
    }

    #[tokio::test]
    async fn test_query() {
        let store = Arc::new(MockStore::new().respond(
            "from events",
            RawResult::new(vec![Series::new(
                "events",
                &["country", "visits"],
                vec![vec![json!("US"), json!(15)]],
            )]),
        ));
        let (app, _) = create_test_app(store);

        let response = app
            .oneshot(post_json("/api/v1/query", visits_query()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["documents"][0]["country"], "US");
        assert_eq!(body["documents"][0]["visits"], 15);
        assert_eq!(body["metrics"][0]["key"], "visits");
        assert!(body["queryplan"]["colQueries"].is_object());
        assert!(body.get("anomalies").is_none());
    }

    #[tokio::test]
    async fn test_query_unknown_dimension_type() {
        let (app, _) = create_test_app(Arc::new(MockStore::new()));
        let mut query = visits_query();
        query["dimensions"][0]["datatype"] = json!("polygon");

        let response = app
            .oneshot(post_json("/api/v1/query", query))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "PLAN_ERROR");
    }

    #[tokio::test]
    async fn test_query_invalid_json() {
        let (app, _) = create_test_app(Arc::new(MockStore::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/query")
                    .header("Content-Type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_plan_does_not_touch_store() {
        let store = Arc::new(MockStore::new());
        let (app, _) = create_test_app(store.clone());

        let response = app
            .oneshot(post_json("/api/v1/plan", visits_query()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let statements = body["statements"].as_object().unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements.values().next().unwrap(),
            "select country, sum(visits) as visits from events group by country fill(0)"
        );
        assert!(store.statements().is_empty());
    }

    #[tokio::test]
    async fn test_insert_documents() {
        let store = Arc::new(MockStore::new());
        let (app, _) = create_test_app(store.clone());

        let response = app
            .oneshot(post_json(
                "/api/v1/collections/events/documents",
                json!({"documents": [{"country": "US", "visits": 1}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["inserted"], 1);
        assert_eq!(store.written()[0].measurement, "events");
    }

    #[tokio::test]
    async fn test_insert_empty_documents() {
        let (app, _) = create_test_app(Arc::new(MockStore::new()));

        let response = app
            .oneshot(post_json(
                "/api/v1/collections/events/documents",
                json!({"documents": []}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_drop_collection() {
        let store = Arc::new(MockStore::new());
        let (app, _) = create_test_app(store.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/collections/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.statements(), vec!["DROP SERIES FROM events"]);
    }

    #[tokio::test]
    async fn test_purge_requires_confirmation() {
        let store = Arc::new(MockStore::new());
        let (app, _) = create_test_app(store.clone());

        let purge = |uri: &'static str| {
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap()
        };

        let refused = app.clone().oneshot(purge("/api/v1/database")).await.unwrap();
        assert_eq!(refused.status(), StatusCode::BAD_REQUEST);
        assert!(store.statements().is_empty());

        let purged = app
            .oneshot(purge("/api/v1/database?confirm=true"))
            .await
            .unwrap();
        assert_eq!(purged.status(), StatusCode::OK);
        assert_eq!(store.statements(), vec!["DROP DATABASE test"]);
    }

    #[tokio::test]
    async fn test_closed_provider_returns_unavailable() {
        let (app, provider) = create_test_app(Arc::new(MockStore::new()));
        provider.close().await;

        let response = app
            .oneshot(post_json("/api/v1/query", visits_query()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
