//! Error types for the gateway
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Gateway Error Enum ==
/// Unified error type for the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Fetch rejected or network unreachable
    #[error("Network failure: {0}")]
    Network(String),

    /// Persistent storage operation rejected
    #[error("Store failure: {0}")]
    Store(String),

    /// One or more install-time pre-cache fetches failed
    #[error("Manifest failure: {0}")]
    Manifest(String),

    /// Lifecycle signal arrived in a phase that cannot accept it
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// Request or configuration could not be turned into an upstream request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Wraps a network error with the URL it happened on.
    pub fn network(url: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        GatewayError::Network(format!("{}: {}", url, err))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Store(format!("snapshot encoding: {}", err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::Network(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Manifest(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Lifecycle(_) => StatusCode::CONFLICT,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (GatewayError::Network("down".into()), StatusCode::BAD_GATEWAY),
            (GatewayError::Store("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (GatewayError::Manifest("/a".into()), StatusCode::BAD_GATEWAY),
            (GatewayError::Lifecycle("idle".into()), StatusCode::CONFLICT),
            (GatewayError::InvalidRequest("uri".into()), StatusCode::BAD_REQUEST),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_io_error_is_store_failure() {
        let err: GatewayError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, GatewayError::Store(_)));
    }
}
