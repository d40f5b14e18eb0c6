//! Scripted in-process network shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use offline_gateway::cache::{CacheRegistry, CapturedResponse, RequestKey, StoreHandle};
use offline_gateway::error::Result;
use offline_gateway::{CacheVersion, Config, Fetcher, Gateway, GatewayError, GatewayRequest};

pub const ORIGIN: &str = "http://shop.test";

/// Canned replies keyed by path; unknown paths answer 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    replies: Mutex<HashMap<String, (u16, String)>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
    count: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn fetched(&self, path: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|p| p == path)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &GatewayRequest) -> Result<CapturedResponse> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(request.path().to_string());

        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Network(format!("{}: offline", request.url)));
        }

        let reply = self.replies.lock().unwrap().get(request.path()).cloned();
        let (status, body) = reply.unwrap_or((404, "not found".to_string()));
        Ok(CapturedResponse::new(
            status,
            vec![("content-type".to_string(), "text/plain".to_string())],
            body,
        ))
    }
}

pub fn config(tag: &str) -> Config {
    Config {
        upstream_url: ORIGIN.to_string(),
        version: CacheVersion::new("store", tag),
        manifest: vec!["/".to_string(), "/offline/".to_string()],
        offline_page: "/offline/".to_string(),
        ..Config::default()
    }
}

/// Fetcher answering the manifest of `config`.
pub fn storefront() -> Arc<ScriptedFetcher> {
    let fetcher = ScriptedFetcher::new();
    fetcher.respond("/", 200, "home");
    fetcher.respond("/offline/", 200, "you are offline");
    fetcher
}

/// A gateway that has been installed and activated.
pub async fn active_gateway(
    config: &Config,
    registry: &CacheRegistry,
    fetcher: &Arc<ScriptedFetcher>,
) -> Gateway {
    let gateway = Gateway::new(config, registry.clone(), fetcher.clone()).unwrap();
    gateway.install().await.unwrap();
    gateway.activate().await.unwrap();
    gateway
}

pub fn get(gateway: &Gateway, path: &str) -> GatewayRequest {
    GatewayRequest::get(gateway.url_for(path).unwrap())
}

pub fn key(path: &str) -> RequestKey {
    RequestKey::get(&reqwest::Url::parse(ORIGIN).unwrap().join(path).unwrap())
}

/// Polls a store until `key` holds `body`, failing after one second.
pub async fn wait_for_body(store: &StoreHandle, key: &RequestKey, body: &[u8]) {
    for _ in 0..100 {
        if let Some(response) = store.peek(key).await {
            if response.body == body {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("store {} never held the expected body for {}", store.name(), key);
}
