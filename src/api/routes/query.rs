//! Query Routes
//!
//! - POST /api/v1/query - Compile, execute and merge a query descriptor
//! - POST /api/v1/plan - Compile a descriptor and render its statements

use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::routes::request_context;
use crate::api::state::AppState;
use crate::provider::{PlanResponse, QueryResponse};
use crate::query::QueryDescriptor;

/// POST /api/v1/query
///
/// Returns `{dimensions, metrics, documents, queryplan}` plus `anomalies`
/// when some rows could not be fully keyed.
pub async fn execute_query(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(descriptor): Json<QueryDescriptor>,
) -> ApiResult<Json<QueryResponse>> {
    let ctx = request_context(&state, &headers);
    let response = state.provider.query(&ctx, &descriptor).await?;
    Ok(Json(response))
}

/// POST /api/v1/plan
///
/// Dry run: nothing is sent to the store.
pub async fn plan_query(
    State(state): State<Arc<AppState>>,
    Json(descriptor): Json<QueryDescriptor>,
) -> ApiResult<Json<PlanResponse>> {
    Ok(Json(state.provider.plan(&descriptor)?))
}
