//! Shared helpers for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::cache::{CapturedResponse, RequestKey, StoreHandle};
use crate::error::{GatewayError, Result};
use crate::network::{Fetcher, GatewayRequest};

/// In-process network with canned replies keyed by path.
///
/// Unknown paths answer 404. Going offline makes every fetch fail.
#[derive(Default)]
pub struct ScriptedFetcher {
    replies: Mutex<HashMap<String, (u16, String)>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

/// Holds fetches until released.
pub struct Gate(Arc<Semaphore>);

impl Gate {
    pub fn release(&self) {
        self.0.add_permits(1024);
    }
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Blocks every subsequent fetch until the returned gate is released.
    pub fn hold(&self) -> Gate {
        let semaphore = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(semaphore.clone());
        Gate(semaphore)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &GatewayRequest) -> Result<CapturedResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| GatewayError::Network(e.to_string()))?;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Network(format!("{}: offline", request.url)));
        }

        let reply = self.replies.lock().unwrap().get(request.path()).cloned();
        let (status, body) = reply.unwrap_or((404, "not found".to_string()));
        Ok(CapturedResponse::new(status, vec![], body))
    }
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
