//! Offline Gateway - A request-interception cache gateway
//!
//! Classifies intercepted GET requests, serves them cache-first,
//! network-first or stale-while-revalidate from named, versioned stores, and
//! degrades to cached content when the network is unavailable.

pub mod api;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod network;
pub mod strategy;
pub mod tasks;

#[cfg(test)]
mod test_support;

pub use api::AppState;
pub use classify::{classify, Category};
pub use config::{CacheVersion, Config};
pub use error::GatewayError;
pub use lifecycle::{Gateway, Phase};
pub use network::{Fetcher, GatewayRequest, HttpFetcher};
pub use tasks::spawn_trim_task;
