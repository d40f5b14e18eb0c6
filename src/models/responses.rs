//! Response DTOs for the gateway control API
//!
//! Defines the structure of outgoing control-route bodies, and how a
//! captured response is replayed to the client.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::cache::{CapturedResponse, StoreStats};
use crate::lifecycle::Phase;

// == Captured Response Replay ==
impl IntoResponse for CapturedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::from_str(&value),
            ) {
                headers.append(name, value);
            }
        }

        response
    }
}

/// Response body for install (POST /_gateway/install)
#[derive(Debug, Clone, Serialize)]
pub struct PhaseResponse {
    pub phase: Phase,
    pub static_store: String,
}

/// Response body for activation (POST /_gateway/activate)
#[derive(Debug, Clone, Serialize)]
pub struct ActivateResponse {
    pub phase: Phase,
    /// Stores removed by this activation
    pub deleted: Vec<String>,
}

/// Response body for a manual size governor tick (POST /_gateway/trim)
#[derive(Debug, Clone, Serialize)]
pub struct TrimResponse {
    pub store: String,
    pub evicted: usize,
    pub max_entries: usize,
}

/// Acknowledgement for fire-and-forget signals (message, sync)
#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    pub accepted: bool,
}

impl AckResponse {
    pub fn accepted() -> Self {
        Self { accepted: true }
    }
}

/// Statistics for one store
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatsResponse {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub evictions: u64,
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StoreStatsResponse {
    pub fn new(name: impl Into<String>, stats: &StoreStats) -> Self {
        Self {
            name: name.into(),
            hits: stats.hits,
            misses: stats.misses,
            writes: stats.writes,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the stats endpoint (GET /_gateway/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub phase: Phase,
    pub version: String,
    pub controlling: bool,
    pub stores: Vec<StoreStatsResponse>,
}

/// Response body for the health endpoint (GET /_gateway/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
