//! Store Statistics Module
//!
//! Per-store counters surfaced by the stats endpoint.

use serde::Serialize;

/// Something that happened to a store and is worth counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Hit,
    Miss,
    Write,
    Eviction,
}

// == Store Stats ==
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub hits: u64,
    pub misses: u64,
    /// Responses written, overwrites included
    pub writes: u64,
    /// Entries removed by the size governor
    pub evictions: u64,
    pub total_entries: usize,
}

impl StoreStats {
    pub fn record(&mut self, event: StoreEvent) {
        let counter = match event {
            StoreEvent::Hit => &mut self.hits,
            StoreEvent::Miss => &mut self.misses,
            StoreEvent::Write => &mut self.writes,
            StoreEvent::Eviction => &mut self.evictions,
        };
        *counter += 1;
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Share of lookups answered from the store; 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    /// Copy of the counters carrying the store's current size.
    pub fn with_entries(&self, total_entries: usize) -> Self {
        Self {
            total_entries,
            ..self.clone()
        }
    }
}
