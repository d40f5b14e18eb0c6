//! Insertion Log Module
//!
//! Append-only record of write order, used as the age of an entry.

use std::collections::VecDeque;

use crate::cache::RequestKey;

// == Insertion Log ==
/// Tracks keys in the order they were written.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest write
/// - Back = Newest write
///
/// Reads never reorder the log; eviction is first-in first-out.
#[derive(Debug, Default, Clone)]
pub struct InsertionLog {
    order: VecDeque<RequestKey>,
}

impl InsertionLog {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Append ==
    /// Records a write. Rewriting a key moves it to the newest position.
    pub fn append(&mut self, key: &RequestKey) {
        self.remove(key);
        self.order.push_back(key.clone());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &RequestKey) {
        self.order.retain(|k| k != key);
    }

    // == Oldest ==
    /// Returns up to `count` keys, oldest first, without removing them.
    pub fn oldest(&self, count: usize) -> Vec<RequestKey> {
        self.order.iter().take(count).cloned().collect()
    }

    /// All keys, oldest first.
    pub fn keys(&self) -> Vec<RequestKey> {
        self.order.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse("http://shop.test").unwrap().join(path).unwrap())
    }

    #[test]
    fn test_append_keeps_write_order() {
        let mut log = InsertionLog::new();
        log.append(&key("/a"));
        log.append(&key("/b"));
        log.append(&key("/c"));

        assert_eq!(log.keys(), vec![key("/a"), key("/b"), key("/c")]);
        assert_eq!(log.oldest(2), vec![key("/a"), key("/b")]);
    }

    #[test]
    fn test_rewrite_moves_to_newest() {
        let mut log = InsertionLog::new();
        log.append(&key("/a"));
        log.append(&key("/b"));
        log.append(&key("/a"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.keys(), vec![key("/b"), key("/a")]);
    }

    #[test]
    fn test_remove_nonexistent_key() {
        let mut log = InsertionLog::new();
        log.append(&key("/a"));

        log.remove(&key("/missing"));

        assert_eq!(log.len(), 1);
        assert!(!log.is_empty());
    }

    #[test]
    fn test_oldest_more_than_len() {
        let mut log = InsertionLog::new();
        log.append(&key("/a"));

        assert_eq!(log.oldest(10), vec![key("/a")]);
        assert!(InsertionLog::new().oldest(3).is_empty());
    }
}
