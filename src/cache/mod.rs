//! Cache Module
//!
//! Named, versioned stores of captured responses and the registry owning them.

mod entry;
mod order;
mod registry;
mod stats;
mod store;


// Re-export public types
pub use entry::{is_hop_by_hop, CapturedResponse, RequestKey};
pub use order::InsertionLog;
pub use registry::{CacheRegistry, StoreHandle};
pub use stats::{StoreEvent, StoreStats};
pub use store::{CacheStore, SnapshotEntry, StoreSnapshot};
