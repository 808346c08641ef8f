//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! Query and plan bodies are the descriptor and provider response types
//! themselves; only the collection endpoints need their own shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================
// COLLECTION DTOs
// ============================================

/// Document insert request
#[derive(Debug, Deserialize)]
pub struct InsertRequest {
    /// Documents to flatten and write
    pub documents: Vec<Value>,
    /// Physical measurement, defaults to the collection key
    #[serde(default, rename = "storeKey")]
    pub store_key: Option<String>,
    /// Field holding each document's time
    #[serde(default)]
    pub time_field: Option<String>,
}

/// Document insert response
#[derive(Debug, Serialize)]
pub struct InsertResponse {
    /// Status: "ok"
    pub status: String,
    /// Number of points written
    pub inserted: usize,
}

/// Acknowledgement for destructive operations
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: String,
    /// Collection or database removed
    pub target: String,
}

/// Query string of `DELETE /api/v1/database`
#[derive(Debug, Default, Deserialize)]
pub struct PurgeParams {
    #[serde(default)]
    pub confirm: bool,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// Store reachability: "ok", "error" or "closed"
    pub store: String,
    pub uptime_seconds: u64,
    pub version: String,
}
