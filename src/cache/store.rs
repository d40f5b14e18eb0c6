//! Cache Store Module
//!
//! One named container mapping request keys to captured responses, with the
//! write order kept alongside for the size governor.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cache::{CapturedResponse, InsertionLog, RequestKey, StoreEvent, StoreStats};

// == Cache Store ==
/// In-memory contents of a single named store.
#[derive(Debug)]
pub struct CacheStore {
    name: String,
    /// Position in the registry's creation order
    sequence: u64,
    /// Key-response storage
    entries: HashMap<RequestKey, CapturedResponse>,
    /// Write order tracker
    log: InsertionLog,
    stats: StoreStats,
    /// Set once the store has been deleted from the registry
    retired: bool,
}

/// On-disk form of a store: entries oldest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub name: String,
    #[serde(default)]
    pub sequence: u64,
    pub entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub key: RequestKey,
    pub response: CapturedResponse,
}

impl CacheStore {
    // == Constructor ==
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequence: 0,
            entries: HashMap::new(),
            log: InsertionLog::new(),
            stats: StoreStats::default(),
            retired: false,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Rebuilds a store from a snapshot, preserving write order.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut store = Self::new(snapshot.name).with_sequence(snapshot.sequence);
        for entry in snapshot.entries {
            store.log.append(&entry.key);
            store.entries.insert(entry.key, entry.response);
        }
        store
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let entries = self
            .log
            .keys()
            .into_iter()
            .filter_map(|key| {
                self.entries.get(&key).map(|response| SnapshotEntry {
                    key,
                    response: response.clone(),
                })
            })
            .collect();

        StoreSnapshot {
            name: self.name.clone(),
            sequence: self.sequence,
            entries,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    // == Get ==
    /// Looks up a key, recording a hit or miss.
    pub fn get(&mut self, key: &RequestKey) -> Option<CapturedResponse> {
        match self.entries.get(key) {
            Some(response) => {
                self.stats.record(StoreEvent::Hit);
                Some(response.clone())
            }
            None => {
                self.stats.record(StoreEvent::Miss);
                None
            }
        }
    }

    /// Looks up a key without touching statistics.
    pub fn peek(&self, key: &RequestKey) -> Option<&CapturedResponse> {
        self.entries.get(key)
    }

    // == Put ==
    /// Stores a response. An existing entry for the key is replaced and the
    /// key becomes the newest write.
    pub fn put(&mut self, key: RequestKey, response: CapturedResponse) {
        self.log.append(&key);
        self.entries.insert(key, response);
        self.stats.record(StoreEvent::Write);
    }

    // == Delete Key ==
    /// Removes one entry. Returns false when the key was absent.
    pub fn delete_key(&mut self, key: &RequestKey) -> bool {
        if self.entries.remove(key).is_some() {
            self.log.remove(key);
            true
        } else {
            false
        }
    }

    /// Removes one entry on behalf of the size governor.
    pub fn evict(&mut self, key: &RequestKey) -> bool {
        let removed = self.delete_key(key);
        if removed {
            self.stats.record(StoreEvent::Eviction);
        }
        removed
    }

    // == Keys ==
    /// All keys in insertion order, oldest first.
    pub fn keys(&self) -> Vec<RequestKey> {
        self.log.keys()
    }

    /// Up to `count` keys, oldest write first.
    pub fn oldest(&self, count: usize) -> Vec<RequestKey> {
        self.log.oldest(count)
    }

    pub fn stats(&self) -> StoreStats {
        self.stats.with_entries(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn retire(&mut self) {
        self.retired = true;
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }
}
