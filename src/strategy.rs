//! Strategy Engine
//!
//! Cache-first, network-first and stale-while-revalidate, each run against a
//! named store from the registry. Only exact 200 responses are written back.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::cache::{CacheRegistry, CapturedResponse, StoreHandle};
use crate::classify::Category;
use crate::error::{GatewayError, Result};
use crate::network::{Fetcher, GatewayRequest};

// == Strategy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

/// Which of the two versioned stores a strategy writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreRole {
    Static,
    Dynamic,
}

/// Fixed category → strategy → store assignment.
pub fn route_for(category: Category) -> (Strategy, StoreRole) {
    match category {
        Category::StaticAsset => (Strategy::CacheFirst, StoreRole::Static),
        Category::Image => (Strategy::CacheFirst, StoreRole::Dynamic),
        Category::Api => (Strategy::NetworkFirst, StoreRole::Dynamic),
        Category::Page => (Strategy::StaleWhileRevalidate, StoreRole::Dynamic),
    }
}

// == Strategy Engine ==
#[derive(Clone)]
pub struct StrategyEngine {
    registry: CacheRegistry,
    fetcher: Arc<dyn Fetcher>,
}

impl StrategyEngine {
    pub fn new(registry: CacheRegistry, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { registry, fetcher }
    }

    pub async fn run(
        &self,
        strategy: Strategy,
        request: &GatewayRequest,
        store: &str,
    ) -> Result<CapturedResponse> {
        match strategy {
            Strategy::CacheFirst => self.cache_first(request, store).await,
            Strategy::NetworkFirst => self.network_first(request, store).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request, store).await,
        }
    }

    // == Cache First ==
    /// Serves a stored entry without touching the network; on a miss, fetches
    /// and stores. A miss with no network is a failure.
    pub async fn cache_first(
        &self,
        request: &GatewayRequest,
        store: &str,
    ) -> Result<CapturedResponse> {
        let store = self.registry.open(store).await?;

        if let Some(cached) = store.get(&request.key()).await {
            debug!(url = %request.url, store = store.name(), "cache-first hit");
            return Ok(cached);
        }

        fetch_and_store(self.fetcher.as_ref(), request, &store).await
    }

    // == Network First ==
    /// Fetches first; falls back to the store only when the fetch fails.
    pub async fn network_first(
        &self,
        request: &GatewayRequest,
        store: &str,
    ) -> Result<CapturedResponse> {
        let store = self.registry.open(store).await?;

        match fetch_and_store(self.fetcher.as_ref(), request, &store).await {
            Ok(response) => Ok(response),
            Err(err) => match store.get(&request.key()).await {
                Some(cached) => {
                    debug!(url = %request.url, error = %err, "network-first served from store");
                    Ok(cached)
                }
                None => Err(err),
            },
        }
    }

    // == Stale While Revalidate ==
    /// Returns the stored entry at once when present and refreshes it in a
    /// detached task. On a cold store, waits for that same fetch.
    pub async fn stale_while_revalidate(
        &self,
        request: &GatewayRequest,
        store: &str,
    ) -> Result<CapturedResponse> {
        let store = self.registry.open(store).await?;
        let cached = store.get(&request.key()).await;

        let (tx, rx) = oneshot::channel();
        let fetcher = self.fetcher.clone();
        let background_request = request.clone();
        let background_store = store.clone();

        // never joined; completion is only visible through the store
        tokio::spawn(async move {
            let outcome =
                fetch_and_store(fetcher.as_ref(), &background_request, &background_store).await;
            if let Err(err) = &outcome {
                debug!(url = %background_request.url, error = %err, "revalidation failed");
            }
            let _ = tx.send(outcome);
        });

        match cached {
            Some(cached) => Ok(cached),
            None => rx.await.unwrap_or_else(|_| {
                Err(GatewayError::Network(format!(
                    "{}: revalidation task dropped",
                    request.url
                )))
            }),
        }
    }
}

/// Fetches `request` and writes a 200 response into `store`.
///
/// A failed write does not fail the request: the fresh response is still
/// returned and the failure is logged.
async fn fetch_and_store(
    fetcher: &dyn Fetcher,
    request: &GatewayRequest,
    store: &StoreHandle,
) -> Result<CapturedResponse> {
    let response = fetcher.fetch(request).await?;

    if response.is_cacheable() {
        if let Err(err) = store.put(request.key(), response.clone()).await {
            warn!(url = %request.url, store = store.name(), error = %err, "failed to store response");
        }
    } else {
        debug!(url = %request.url, status = response.status, "response not cached");
    }

    Ok(response)
}
