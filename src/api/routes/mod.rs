//! API Routes
//!
//! Route handlers organized by functionality.

pub mod collections;
pub mod health;
pub mod query;

use axum::http::HeaderMap;

use crate::api::state::AppState;
use crate::provider::QueryContext;

/// Header carrying a caller-supplied request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request context from the `x-request-id` header, or a fresh id
pub(crate) fn request_context(state: &AppState, headers: &HeaderMap) -> QueryContext {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(QueryContext::new)
        .unwrap_or_else(|| QueryContext::generate(state.provider.helpers().as_ref()))
}
