//! API Routes
//!
//! Configures the Axum router: control routes under `/_gateway`, and every
//! other request falls through to the intercepting proxy.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{
    activate_handler, health_handler, install_handler, message_handler, proxy_handler,
    stats_handler, sync_handler, trim_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/_gateway/install", post(install_handler))
        .route("/_gateway/activate", post(activate_handler))
        .route("/_gateway/message", post(message_handler))
        .route("/_gateway/sync", post(sync_handler))
        .route("/_gateway/trim", post(trim_handler))
        .route("/_gateway/stats", get(stats_handler))
        .route("/_gateway/health", get(health_handler))
        .fallback(proxy_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheRegistry;
    use crate::config::Config;
    use crate::lifecycle::Gateway;
    use crate::test_support::ScriptedFetcher;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app(fetcher: Arc<ScriptedFetcher>) -> Router {
        let config = Config {
            upstream_url: "http://shop.test".to_string(),
            manifest: vec![],
            ..Config::default()
        };
        let gateway = Gateway::new(&config, CacheRegistry::in_memory(), fetcher).unwrap();
        create_router(AppState::new(Arc::new(gateway)))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app(Arc::new(ScriptedFetcher::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/_gateway/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_activate_before_install_is_conflict() {
        let app = create_test_app(Arc::new(ScriptedFetcher::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/_gateway/activate")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unknown_path_is_proxied() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("/about/", 200, "about us");
        let app = create_test_app(fetcher.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/about/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_offline_pass_through_is_bad_gateway() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.go_offline();
        let app = create_test_app(fetcher);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/orders/3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
