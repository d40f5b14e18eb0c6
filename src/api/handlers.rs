//! API Handlers
//!
//! HTTP request handlers for the proxy route and each control endpoint.

use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{Request, State},
    Json,
};
use reqwest::Url;
use serde_json::Value;

use crate::cache::CapturedResponse;
use crate::error::{GatewayError, Result};
use crate::lifecycle::Gateway;
use crate::models::{
    AckResponse, ActivateResponse, HealthResponse, PhaseResponse, StatsResponse,
    StoreStatsResponse, SyncRequest, TrimResponse,
};
use crate::network::GatewayRequest;

/// Largest request body forwarded upstream.
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

/// Turns an inbound HTTP request into a gateway request.
///
/// Origin-form targets resolve against the upstream origin; absolute-form
/// targets keep their own origin so cross-origin requests can be told apart.
pub async fn into_gateway_request(origin: &Url, request: Request) -> Result<GatewayRequest> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, MAX_BODY_SIZE)
        .await
        .map_err(|e| GatewayError::InvalidRequest(format!("request body: {}", e)))?;

    let parsed = if parts.uri.scheme().is_some() && parts.uri.authority().is_some() {
        Url::parse(&parts.uri.to_string())
    } else {
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        origin.join(target)
    };
    let url =
        parsed.map_err(|e| GatewayError::InvalidRequest(format!("{}: {}", parts.uri, e)))?;

    Ok(GatewayRequest::new(parts.method, url)
        .with_headers(parts.headers)
        .with_body(body))
}

/// Fallback handler: every request not addressed to a control route.
pub async fn proxy_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<CapturedResponse> {
    let request = into_gateway_request(state.gateway.origin(), request).await?;
    state.gateway.handle(&request).await
}

/// Handler for POST /_gateway/install
pub async fn install_handler(State(state): State<AppState>) -> Result<Json<PhaseResponse>> {
    state.gateway.install().await?;

    Ok(Json(PhaseResponse {
        phase: state.gateway.phase().await,
        static_store: state.gateway.version().static_store(),
    }))
}

/// Handler for POST /_gateway/activate
pub async fn activate_handler(State(state): State<AppState>) -> Result<Json<ActivateResponse>> {
    let deleted = state.gateway.activate().await?;

    Ok(Json(ActivateResponse {
        phase: state.gateway.phase().await,
        deleted,
    }))
}

/// Handler for POST /_gateway/message
pub async fn message_handler(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Json<AckResponse> {
    state.gateway.on_message(&payload);
    Json(AckResponse::accepted())
}

/// Handler for POST /_gateway/sync
pub async fn sync_handler(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<AckResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(GatewayError::InvalidRequest(error_msg));
    }

    state.gateway.on_sync(&req.tag);
    Ok(Json(AckResponse::accepted()))
}

/// Handler for POST /_gateway/trim
pub async fn trim_handler(State(state): State<AppState>) -> Result<Json<TrimResponse>> {
    let evicted = state.gateway.trim_dynamic_store().await?;

    Ok(Json(TrimResponse {
        store: state.gateway.version().dynamic_store(),
        evicted,
        max_entries: state.gateway.max_dynamic_entries(),
    }))
}

/// Handler for GET /_gateway/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stores = state
        .gateway
        .registry()
        .stats()
        .await
        .iter()
        .map(|(name, stats)| StoreStatsResponse::new(name, stats))
        .collect();

    Json(StatsResponse {
        phase: state.gateway.phase().await,
        version: state.gateway.version().tag.clone(),
        controlling: state.gateway.is_controlling(),
        stores,
    })
}

/// Handler for GET /_gateway/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
