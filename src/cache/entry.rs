//! Cache Entry Module
//!
//! Defines request keys and the captured responses stored against them.

use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Headers describing the connection rather than the payload. Never captured.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Returns true for headers that must not be copied between hops.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

// == Request Key ==
/// Canonical identity of a stored request: method plus URL without fragment.
///
/// Only GET requests are ever stored, so every key starts with `GET `.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestKey(String);

impl RequestKey {
    /// Key for a GET of the given URL.
    pub fn get(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self(format!("GET {}", url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// == Captured Response ==
/// Snapshot of a response: status, headers and the full body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// When the response was captured from the network or synthesized
    pub captured_at: DateTime<Utc>,
}

impl CapturedResponse {
    // == Constructor ==
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            captured_at: Utc::now(),
        }
    }

    /// Captures a response from its parts, dropping hop-by-hop and non-UTF-8 headers.
    pub fn from_parts(status: StatusCode, headers: &HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        let headers = headers
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self::new(status.as_u16(), headers, body)
    }

    /// Synthesized answer for a page with no network and nothing cached.
    pub fn service_unavailable() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE.as_u16(),
            vec![(
                "content-type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            )],
            "Offline",
        )
    }

    /// Only exact 200 responses may be written to a store.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }

    /// First value of a header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_drops_fragment() {
        let a = RequestKey::get(&url("http://shop.test/products/?page=2#top"));
        let b = RequestKey::get(&url("http://shop.test/products/?page=2"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "GET http://shop.test/products/?page=2");
    }

    #[test]
    fn test_key_keeps_query() {
        let a = RequestKey::get(&url("http://shop.test/api/orders?page=1"));
        let b = RequestKey::get(&url("http://shop.test/api/orders?page=2"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_only_200_is_cacheable() {
        assert!(CapturedResponse::new(200, vec![], "ok").is_cacheable());
        for status in [201, 204, 301, 304, 404, 500, 503] {
            assert!(!CapturedResponse::new(status, vec![], "").is_cacheable());
        }
    }

    #[test]
    fn test_from_parts_drops_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/css"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("connection", HeaderValue::from_static("keep-alive"));

        let resp = CapturedResponse::from_parts(StatusCode::OK, &headers, "body{}");

        assert_eq!(resp.header("Content-Type"), Some("text/css"));
        assert_eq!(resp.header("transfer-encoding"), None);
        assert_eq!(resp.header("connection"), None);
        assert_eq!(resp.body, b"body{}");
    }

    #[test]
    fn test_service_unavailable() {
        let resp = CapturedResponse::service_unavailable();
        assert_eq!(resp.status, 503);
        assert!(!resp.is_cacheable());
        assert_eq!(resp.body, b"Offline");
    }
}
