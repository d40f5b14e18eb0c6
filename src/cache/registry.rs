//! Cache Store Registry
//!
//! Owns every named store. Stores are created lazily on first open, can be
//! listed and deleted, and are optionally snapshotted to a directory so they
//! survive restarts.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, CapturedResponse, RequestKey, StoreSnapshot, StoreStats};
use crate::error::Result;

// == Store Handle ==
/// Shared handle to one open store.
///
/// Mutations are last-writer-wins at key granularity; two requests for the
/// same key may race to populate it.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    name: Arc<str>,
    inner: Arc<RwLock<CacheStore>>,
    snapshot_dir: Option<Arc<PathBuf>>,
}

impl StoreHandle {
    fn new(store: CacheStore, snapshot_dir: Option<Arc<PathBuf>>) -> Self {
        Self {
            name: Arc::from(store.name()),
            inner: Arc::new(RwLock::new(store)),
            snapshot_dir,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a key, recording a hit or miss.
    pub async fn get(&self, key: &RequestKey) -> Option<CapturedResponse> {
        self.inner.write().await.get(key)
    }

    /// Looks up a key without touching statistics.
    pub async fn peek(&self, key: &RequestKey) -> Option<CapturedResponse> {
        self.inner.read().await.peek(key).cloned()
    }

    /// Writes a response, replacing any previous entry for the key.
    pub async fn put(&self, key: RequestKey, response: CapturedResponse) -> Result<()> {
        let mut store = self.inner.write().await;
        store.put(key, response);
        self.persist(&store).await;
        Ok(())
    }

    /// Keys in insertion order, oldest first.
    pub async fn keys(&self) -> Vec<RequestKey> {
        self.inner.read().await.keys()
    }

    /// Up to `count` of the oldest keys.
    pub async fn oldest(&self, count: usize) -> Vec<RequestKey> {
        self.inner.read().await.oldest(count)
    }

    /// Removes one entry. Returns false when the key was absent.
    pub async fn delete_key(&self, key: &RequestKey) -> Result<bool> {
        let mut store = self.inner.write().await;
        let removed = store.delete_key(key);
        if removed {
            self.persist(&store).await;
        }
        Ok(removed)
    }

    /// Removes one entry on behalf of the size governor.
    pub async fn evict(&self, key: &RequestKey) -> Result<bool> {
        let mut store = self.inner.write().await;
        let removed = store.evict(key);
        if removed {
            self.persist(&store).await;
        }
        Ok(removed)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn stats(&self) -> StoreStats {
        self.inner.read().await.stats()
    }

    /// Writes the store snapshot while the caller holds the write lock, so
    /// snapshots land on disk in mutation order.
    ///
    /// The in-memory change already happened and stands. A failed write is
    /// logged; the next mutation writes the full snapshot again.
    async fn persist(&self, store: &CacheStore) {
        let Some(dir) = &self.snapshot_dir else {
            return;
        };
        if store.is_retired() {
            return;
        }
        if let Err(err) = write_snapshot(dir, &store.snapshot()).await {
            warn!(store = store.name(), error = %err, "failed to write store snapshot");
        }
    }
}

// == Cache Registry ==
/// Registry of named stores, in creation order.
///
/// Creation order survives restarts through each store's sequence number.
#[derive(Debug, Clone, Default)]
pub struct CacheRegistry {
    stores: Arc<RwLock<Vec<StoreHandle>>>,
    next_sequence: Arc<AtomicU64>,
    snapshot_dir: Option<Arc<PathBuf>>,
}

impl CacheRegistry {
    /// Creates a registry that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a registry persisted under `dir`, restoring any stores found there.
    pub async fn persistent(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let dir = Arc::new(dir);
        let mut restored = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.as_path()).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let raw = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<StoreSnapshot>(&raw) {
                Ok(snapshot) => {
                    debug!(store = %snapshot.name, entries = snapshot.entries.len(), "restored store");
                    restored.push(CacheStore::from_snapshot(snapshot));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable store snapshot"),
            }
        }

        restored.sort_by(|a, b| {
            a.sequence()
                .cmp(&b.sequence())
                .then_with(|| a.name().cmp(b.name()))
        });
        let next_sequence = restored.iter().map(|s| s.sequence() + 1).max().unwrap_or(0);
        let handles: Vec<StoreHandle> = restored
            .into_iter()
            .map(|store| StoreHandle::new(store, Some(dir.clone())))
            .collect();
        info!(dir = %dir.display(), stores = handles.len(), "cache registry loaded");

        Ok(Self {
            stores: Arc::new(RwLock::new(handles)),
            next_sequence: Arc::new(AtomicU64::new(next_sequence)),
            snapshot_dir: Some(dir),
        })
    }

    // == Open ==
    /// Returns the named store, creating it when absent.
    pub async fn open(&self, name: &str) -> Result<StoreHandle> {
        if let Some(handle) = self.find(name).await {
            return Ok(handle);
        }

        let mut stores = self.stores.write().await;
        // another task may have created it while we waited for the lock
        if let Some(handle) = stores.iter().find(|h| h.name() == name) {
            return Ok(handle.clone());
        }

        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let store = CacheStore::new(name).with_sequence(sequence);
        if let Some(dir) = &self.snapshot_dir {
            write_snapshot(dir, &store.snapshot()).await?;
        }

        debug!(store = name, "created store");
        let handle = StoreHandle::new(store, self.snapshot_dir.clone());
        stores.push(handle.clone());
        Ok(handle)
    }

    /// Returns the named store only if it already exists.
    pub async fn find(&self, name: &str) -> Option<StoreHandle> {
        self.stores
            .read()
            .await
            .iter()
            .find(|h| h.name() == name)
            .cloned()
    }

    // == List Names ==
    pub async fn list_names(&self) -> BTreeSet<String> {
        self.stores
            .read()
            .await
            .iter()
            .map(|h| h.name().to_string())
            .collect()
    }

    // == Delete ==
    /// Deletes a whole store. Deleting an absent store is a no-op returning false.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let removed = {
            let mut stores = self.stores.write().await;
            stores
                .iter()
                .position(|h| h.name() == name)
                .map(|idx| stores.remove(idx))
        };

        let Some(handle) = removed else {
            return Ok(false);
        };

        handle.inner.write().await.retire();

        if let Some(dir) = &self.snapshot_dir {
            match tokio::fs::remove_file(snapshot_path(dir, name)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        debug!(store = name, "deleted store");
        Ok(true)
    }

    // == Match Any ==
    /// Searches every store, in creation order, for an exact key.
    pub async fn match_any(&self, key: &RequestKey) -> Option<CapturedResponse> {
        let handles = self.stores.read().await.clone();
        for handle in handles {
            if let Some(response) = handle.peek(key).await {
                return Some(response);
            }
        }
        None
    }

    /// Statistics for every store, by name.
    pub async fn stats(&self) -> Vec<(String, StoreStats)> {
        let handles = self.stores.read().await.clone();
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            out.push((handle.name().to_string(), handle.stats().await));
        }
        out
    }
}

// == Snapshot Files ==
fn snapshot_path(dir: &Path, name: &str) -> PathBuf {
    let file: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{}.json", file))
}

/// Writes via a temporary file and rename so a crash never leaves a torn snapshot.
async fn write_snapshot(dir: &Path, snapshot: &StoreSnapshot) -> Result<()> {
    let path = snapshot_path(dir, &snapshot.name);
    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec(snapshot)?;

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, &path).await?;
    Ok(())
}
