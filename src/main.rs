//! Offline Gateway - A request-interception cache gateway
//!
//! Runs the gateway as a reverse proxy in front of an upstream origin.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_gateway::api::{create_router, AppState};
use offline_gateway::cache::CacheRegistry;
use offline_gateway::{spawn_trim_task, Config, Gateway, HttpFetcher};

/// Main entry point for the gateway.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the cache registry, restoring persisted stores
/// 4. Install (pre-cache the manifest) and activate (purge old versions)
/// 5. Start the background size governor
/// 6. Serve on the configured port until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Offline Gateway");

    let config = Config::from_env();
    info!(
        "Configuration loaded: upstream={}, version={}, max_dynamic_entries={}, port={}, trim_interval={}s",
        config.upstream_url,
        config.version.tag,
        config.max_dynamic_entries,
        config.server_port,
        config.trim_interval
    );

    let registry = match &config.cache_dir {
        Some(dir) => CacheRegistry::persistent(dir)
            .await
            .with_context(|| format!("opening cache directory {}", dir.display()))?,
        None => CacheRegistry::in_memory(),
    };

    let fetcher = HttpFetcher::build().context("building upstream client")?;
    let gateway = Arc::new(
        Gateway::new(&config, registry, Arc::new(fetcher)).context("configuring gateway")?,
    );

    // The gateway keeps serving as a pass-through proxy when install fails;
    // the host can retry through POST /_gateway/install.
    match gateway.install().await {
        Ok(()) => {
            if let Err(e) = gateway.activate().await {
                error!(error = %e, "activation failed");
            }
        }
        Err(e) => warn!(error = %e, "install failed, serving in pass-through mode"),
    }

    let trim_handle = spawn_trim_task(gateway.clone(), config.trim_interval);
    info!("Size governor started");

    let app = create_router(AppState::new(gateway));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Gateway listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(trim_handle))
        .await
        .context("serving")?;

    info!("Gateway shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the size governor and allows graceful shutdown.
async fn shutdown_signal(trim_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    trim_handle.abort();
    warn!("Size governor aborted");
}
