//! Host Capabilities
//!
//! Hashing and identifier generation are injected into the planner and the
//! merger rather than reached for globally, so hosts (and tests) can supply
//! their own.

use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Utility capabilities consumed by the query pipeline
pub trait Helpers: Send + Sync {
    /// Deterministic hash of `input`, used for sub-query and row keys
    fn hash(&self, input: &str) -> String;

    /// Fresh unique identifier, used for plan ids
    fn uuid(&self) -> String;
}

/// SHA-256 hashing and random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHelpers;

impl DefaultHelpers {
    pub fn shared() -> Arc<dyn Helpers> {
        Arc::new(Self)
    }
}

impl Helpers for DefaultHelpers {
    fn hash(&self, input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn uuid(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
