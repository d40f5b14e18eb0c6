//! Network Module
//!
//! The request type the gateway works on and the fetcher seam to the upstream
//! network. Fetch timeouts are left to the transport; they surface as plain
//! network failures.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use reqwest::{Client, Url};
use tracing::debug;

use crate::cache::{is_hop_by_hop, CapturedResponse, RequestKey};
use crate::error::{GatewayError, Result};

// == Gateway Request ==
/// An intercepted request: method, absolute URL, headers and body.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl GatewayRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// A bodiless GET of `url`.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Store key for this request. Only meaningful for GET requests.
    pub fn key(&self) -> RequestKey {
        RequestKey::get(&self.url)
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }
}

// == Fetcher ==
/// Issues a request against the network.
///
/// Any status code is a successful fetch; only transport-level failures are
/// errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &GatewayRequest) -> Result<CapturedResponse>;
}

// == HTTP Fetcher ==
/// Fetcher backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher with a default client.
    ///
    /// Redirects are not followed: a 3xx goes back to the client as-is, so it
    /// is never stored under the original key and a POST is never replayed
    /// as a GET.
    pub fn build() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("offline-gateway/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &GatewayRequest) -> Result<CapturedResponse> {
        let headers: HeaderMap = request
            .headers
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()) && name.as_str() != "host")
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| GatewayError::network(&request.url, e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::network(&request.url, e))?;

        debug!(url = %request.url, status = status.as_u16(), bytes = body.len(), "fetched");
        Ok(CapturedResponse::from_parts(status, &headers, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, StatusCode},
        routing::{get, post},
        Router,
    };

    /// Serves a slash-appending redirect and a post/redirect/get form on a
    /// local port.
    async fn spawn_upstream() -> Url {
        let app = Router::new()
            .route(
                "/products",
                get(|| async { (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/products/")]) }),
            )
            .route("/products/", get(|| async { "catalogue" }))
            .route(
                "/contact/",
                post(|| async { (StatusCode::FOUND, [(header::LOCATION, "/thanks/")]) }),
            )
            .route("/thanks/", get(|| async { "thanks" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{}", addr)).unwrap()
    }

    #[tokio::test]
    async fn test_redirect_is_returned_as_is() {
        let origin = spawn_upstream().await;
        let fetcher = HttpFetcher::build().unwrap();

        let request = GatewayRequest::get(origin.join("/products").unwrap());
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.status, 301);
        assert_eq!(response.header("location"), Some("/products/"));
        assert!(!response.is_cacheable());
    }

    #[tokio::test]
    async fn test_post_redirect_is_not_followed() {
        let origin = spawn_upstream().await;
        let fetcher = HttpFetcher::build().unwrap();

        let request = GatewayRequest::new(Method::POST, origin.join("/contact/").unwrap())
            .with_body("name=ada");
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.status, 302);
        assert_eq!(response.header("location"), Some("/thanks/"));
    }

    #[test]
    fn test_request_key_ignores_method_and_body() {
        let url = Url::parse("http://shop.test/api/orders").unwrap();
        let get = GatewayRequest::get(url.clone());
        let with_body = GatewayRequest::get(url).with_body("ignored");

        assert_eq!(get.key(), with_body.key());
        assert_eq!(get.path(), "/api/orders");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_network_failure() {
        let fetcher = HttpFetcher::build().unwrap();
        // port 9 (discard) on localhost is expected to refuse connections
        let request = GatewayRequest::get(Url::parse("http://127.0.0.1:9/").unwrap());

        let result = fetcher.fetch(&request).await;
        assert!(matches!(result, Err(GatewayError::Network(_))));
    }
}
