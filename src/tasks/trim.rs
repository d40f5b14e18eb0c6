//! Size Governor
//!
//! Bounds a store's entry count by deleting its oldest writes. Eviction is
//! first-in first-out by insertion order; reads never extend an entry's life.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheRegistry;
use crate::error::Result;
use crate::lifecycle::Gateway;

/// Trims `store` down to `max_entries`, returning how many entries were evicted.
///
/// A failed deletion is logged and skipped; the next tick picks it up again.
pub async fn trim_store(registry: &CacheRegistry, store: &str, max_entries: usize) -> Result<usize> {
    let handle = registry.open(store).await?;
    let entries = handle.len().await;

    if entries <= max_entries {
        debug!(store, entries, max_entries, "store within bounds");
        return Ok(0);
    }

    let mut evicted = 0;

    for key in handle.oldest(entries - max_entries).await {
        match handle.evict(&key).await {
            Ok(true) => evicted += 1,
            Ok(false) => {}
            Err(err) => warn!(store, %key, error = %err, "failed to evict entry"),
        }
    }

    info!(store, evicted, max_entries, "trimmed store");
    Ok(evicted)
}

/// Spawns a background task that trims the gateway's dynamic store on a
/// fixed interval.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let trim_handle = spawn_trim_task(gateway.clone(), 300);
/// // Later, during shutdown:
/// trim_handle.abort();
/// ```
pub fn spawn_trim_task(gateway: Arc<Gateway>, trim_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(trim_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting size governor with interval of {} seconds",
            trim_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            if let Err(err) = gateway.trim_dynamic_store().await {
                warn!(error = %err, "size governor tick failed, retrying next tick");
            }
        }
    })
}
