//! Collection Routes
//!
//! - POST /api/v1/collections/:key/documents - Insert documents
//! - GET /api/v1/collections/:key/stats - Point counts
//! - DELETE /api/v1/collections/:key - Drop a collection
//! - DELETE /api/v1/database?confirm=true - Drop the whole database

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{DeleteResponse, InsertRequest, InsertResponse, PurgeParams};
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::request_context;
use crate::api::state::AppState;
use crate::provider::{CollectionStats, InsertOptions};
use crate::query::CollectionRef;

/// POST /api/v1/collections/:key/documents
pub async fn insert_documents(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(req): Json<InsertRequest>,
) -> ApiResult<(StatusCode, Json<InsertResponse>)> {
    if req.documents.is_empty() {
        return Err(ApiError::Validation("documents cannot be empty".to_string()));
    }

    let ctx = request_context(&state, &headers);
    let collection = match req.store_key {
        Some(store_key) => CollectionRef::new(key).with_store_key(store_key),
        None => CollectionRef::new(key),
    };
    let options = InsertOptions {
        time_field: req.time_field,
    };

    let inserted = state
        .provider
        .insert(&ctx, &collection, &req.documents, &options)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InsertResponse {
            status: "ok".to_string(),
            inserted,
        }),
    ))
}

/// GET /api/v1/collections/:key/stats
pub async fn collection_stats(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<CollectionStats>> {
    let stats = state.provider.stats(&CollectionRef::new(key)).await?;
    Ok(Json(stats))
}

/// DELETE /api/v1/collections/:key
pub async fn drop_collection(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    state
        .provider
        .drop_collection(&CollectionRef::new(key.clone()))
        .await?;

    Ok(Json(DeleteResponse {
        status: "ok".to_string(),
        target: key,
    }))
}

/// DELETE /api/v1/database
///
/// Requires `?confirm=true`.
pub async fn purge_database(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PurgeParams>,
) -> ApiResult<Json<DeleteResponse>> {
    if !params.confirm {
        return Err(ApiError::Validation(
            "purging the database requires confirm=true".to_string(),
        ));
    }

    state.provider.purge().await?;

    Ok(Json(DeleteResponse {
        status: "ok".to_string(),
        target: "database".to_string(),
    }))
}
