//! Lifecycle Manager
//!
//! Install pre-populates the static store, activation purges stores of other
//! versions and claims request handling, and dispatch routes each intercepted
//! request to its strategy with offline fallbacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::Method;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheRegistry, CapturedResponse, RequestKey};
use crate::classify::{Category, RoutePatterns};
use crate::config::{CacheVersion, Config};
use crate::error::{GatewayError, Result};
use crate::network::{Fetcher, GatewayRequest};
use crate::strategy::{route_for, StoreRole, StrategyEngine};
use crate::tasks::trim_store;

// == Phase ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; a new install is required.
    Redundant,
}

// == Gateway ==
pub struct Gateway {
    version: CacheVersion,
    origin: Url,
    manifest: Vec<String>,
    offline_page: String,
    max_dynamic_entries: usize,
    patterns: RoutePatterns,
    registry: CacheRegistry,
    fetcher: Arc<dyn Fetcher>,
    engine: StrategyEngine,
    phase: RwLock<Phase>,
    /// Set once activation has claimed request handling
    controlling: AtomicBool,
}

impl Gateway {
    pub fn new(config: &Config, registry: CacheRegistry, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let origin = Url::parse(&config.upstream_url).map_err(|e| {
            GatewayError::InvalidRequest(format!("upstream url {}: {}", config.upstream_url, e))
        })?;

        Ok(Self {
            version: config.version.clone(),
            origin,
            manifest: config.manifest.clone(),
            offline_page: config.offline_page.clone(),
            max_dynamic_entries: config.max_dynamic_entries,
            patterns: config.patterns.clone(),
            engine: StrategyEngine::new(registry.clone(), fetcher.clone()),
            registry,
            fetcher,
            phase: RwLock::new(Phase::Idle),
            controlling: AtomicBool::new(false),
        })
    }

    pub fn version(&self) -> &CacheVersion {
        &self.version
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn registry(&self) -> &CacheRegistry {
        &self.registry
    }

    pub async fn phase(&self) -> Phase {
        *self.phase.read().await
    }

    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::SeqCst)
    }

    /// Resolves a path against the upstream origin.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        self.origin
            .join(path)
            .map_err(|e| GatewayError::InvalidRequest(format!("{}: {}", path, e)))
    }

    fn store_name(&self, role: StoreRole) -> String {
        match role {
            StoreRole::Static => self.version.static_store(),
            StoreRole::Dynamic => self.version.dynamic_store(),
        }
    }

    async fn set_phase(&self, phase: Phase) {
        *self.phase.write().await = phase;
    }

    // == Install ==
    /// Fetches every manifest path, then writes them all into the static
    /// store. Any failed or non-200 fetch fails the whole install and nothing
    /// is written.
    pub async fn install(&self) -> Result<()> {
        self.set_phase(Phase::Installing).await;
        let store_name = self.version.static_store();
        info!(store = %store_name, assets = self.manifest.len(), "installing");

        match self.precache(&store_name).await {
            Ok(count) => {
                // skip waiting: activation may follow immediately
                self.set_phase(Phase::Installed).await;
                info!(store = %store_name, assets = count, "install complete");
                Ok(())
            }
            Err(err) => {
                self.set_phase(Phase::Redundant).await;
                error!(store = %store_name, error = %err, "install failed");
                Err(err)
            }
        }
    }

    async fn precache(&self, store_name: &str) -> Result<usize> {
        let mut fetched = Vec::with_capacity(self.manifest.len());

        for path in &self.manifest {
            let url = self
                .url_for(path)
                .map_err(|e| GatewayError::Manifest(e.to_string()))?;
            let request = GatewayRequest::get(url);

            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| GatewayError::Manifest(format!("{}: {}", path, e)))?;
            if !response.is_cacheable() {
                return Err(GatewayError::Manifest(format!(
                    "{}: status {}",
                    path, response.status
                )));
            }

            fetched.push((request.key(), response));
        }

        let store = self.registry.open(store_name).await?;
        let count = fetched.len();
        for (key, response) in fetched {
            store.put(key, response).await?;
        }
        Ok(count)
    }

    // == Activate ==
    /// Deletes every store other than the current static and dynamic ones,
    /// then claims request handling. Idempotent.
    pub async fn activate(&self) -> Result<Vec<String>> {
        match self.phase().await {
            Phase::Idle | Phase::Installing | Phase::Redundant => {
                return Err(GatewayError::Lifecycle(
                    "cannot activate before a successful install".to_string(),
                ))
            }
            Phase::Installed | Phase::Activating | Phase::Activated => {}
        }

        self.set_phase(Phase::Activating).await;
        let keep = [self.version.static_store(), self.version.dynamic_store()];
        let mut deleted = Vec::new();

        for name in self.registry.list_names().await {
            if keep.contains(&name) {
                continue;
            }
            match self.registry.delete(&name).await {
                Ok(true) => {
                    info!(store = %name, "deleted obsolete store");
                    deleted.push(name);
                }
                Ok(false) => {}
                // the next activation retries it
                Err(err) => warn!(store = %name, error = %err, "failed to delete obsolete store"),
            }
        }

        self.controlling.store(true, Ordering::SeqCst);
        self.set_phase(Phase::Activated).await;
        info!(version = %self.version.tag, deleted = deleted.len(), "activated and claimed clients");
        Ok(deleted)
    }

    // == Dispatch ==
    /// Whether a request is handled by a strategy rather than passed through.
    pub fn intercepts(&self, request: &GatewayRequest) -> bool {
        self.is_controlling()
            && request.method == Method::GET
            && request.url.origin() == self.origin.origin()
    }

    /// Handles one request. Requests that are not intercepted go to the
    /// network untouched.
    pub async fn handle(&self, request: &GatewayRequest) -> Result<CapturedResponse> {
        if !self.intercepts(request) {
            debug!(method = %request.method, url = %request.url, "passing through");
            return self.fetcher.fetch(request).await;
        }

        let category = self.patterns.classify(request.path());
        let (strategy, role) = route_for(category);
        let store = self.store_name(role);
        debug!(path = request.path(), %category, ?strategy, store = %store, "dispatching");

        match self.engine.run(strategy, request, &store).await {
            Ok(response) => Ok(response),
            Err(err) => self.fallback(request, category, err).await,
        }
    }

    /// Last resort after a strategy failed: any store holding the exact key,
    /// then for pages the offline document, then a synthesized 503.
    async fn fallback(
        &self,
        request: &GatewayRequest,
        category: Category,
        err: GatewayError,
    ) -> Result<CapturedResponse> {
        warn!(path = request.path(), %category, error = %err, "strategy failed");

        if let Some(hit) = self.registry.match_any(&request.key()).await {
            return Ok(hit);
        }

        if category != Category::Page {
            return Err(err);
        }

        let offline_key = RequestKey::get(&self.url_for(&self.offline_page)?);
        match self.registry.match_any(&offline_key).await {
            Some(document) => {
                info!(path = request.path(), "serving offline document");
                Ok(document)
            }
            None => Ok(CapturedResponse::service_unavailable()),
        }
    }

    // == Signals ==
    /// Generic message signal. Only a performance-measurement tag is logged.
    pub fn on_message(&self, payload: &Value) {
        match payload.get("tag").and_then(Value::as_str) {
            Some(tag) => info!(tag, "performance measurement"),
            None => debug!(%payload, "message received"),
        }
    }

    /// Background-sync hook. Nothing is queued, so there is nothing to replay.
    pub fn on_sync(&self, tag: &str) {
        info!(tag, "background sync requested");
    }

    /// One size governor pass over the dynamic store.
    pub async fn trim_dynamic_store(&self) -> Result<usize> {
        trim_store(
            &self.registry,
            &self.version.dynamic_store(),
            self.max_dynamic_entries,
        )
        .await
    }

    pub fn max_dynamic_entries(&self) -> usize {
        self.max_dynamic_entries
    }
}
