//! API Module
//!
//! The intercepting proxy route and the host control routes.
//!
//! # Endpoints
//! - `POST /_gateway/install` - Run the install phase
//! - `POST /_gateway/activate` - Purge obsolete stores and claim requests
//! - `POST /_gateway/message` - Generic message signal, logged only
//! - `POST /_gateway/sync` - Background-sync hook
//! - `POST /_gateway/trim` - One size governor tick
//! - `GET /_gateway/stats` - Per-store statistics
//! - `GET /_gateway/health` - Health check endpoint
//! - anything else - intercepted and handled by the gateway

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
