//! Request and Response models for the gateway control API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing control-route bodies, and the conversion of
//! captured responses back into HTTP responses.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::SyncRequest;
pub use responses::{
    AckResponse, ActivateResponse, ErrorResponse, HealthResponse, PhaseResponse, StatsResponse,
    StoreStatsResponse, TrimResponse,
};
