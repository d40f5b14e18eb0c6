//! Request DTOs for the gateway control API
//!
//! Defines the structure of incoming control-route bodies.

use serde::Deserialize;

/// Request body for the background-sync hook (POST /_gateway/sync)
///
/// # Fields
/// - `tag`: Name of the sync registration that fired
#[derive(Debug, Clone, Deserialize)]
pub struct SyncRequest {
    pub tag: String,
}

impl SyncRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.tag.trim().is_empty() {
            return Some("Sync tag cannot be empty".to_string());
        }
        None
    }
}
