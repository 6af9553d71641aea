//! HTTP server setup and lifecycle.
//!
//! Configures the axum routers with:
//! - The `GET /` forwarding handler (frontend) or `GET /work` (backend)
//! - Request tracing middleware
//! - Graceful shutdown support

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use reqwest::Url;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::Config;
use crate::observability::http::trace_request;
use crate::observability::HttpMetrics;
use crate::service::{self, BackendClient, WorkState};

/// Server state shared across handlers.
pub struct AppState {
    pub backend: BackendClient,
}

impl AppState {
    /// Build the backend client from configuration.
    ///
    /// Fails if the backend URL does not parse or the HTTP client cannot be
    /// built.
    pub fn from_config(config: &Config, metrics: HttpMetrics) -> anyhow::Result<Self> {
        let url = Url::parse(&config.backend_url)
            .with_context(|| format!("invalid backend URL: {}", config.backend_url))?;
        let backend = BackendClient::new(url, config.backend_timeout(), metrics)
            .context("failed to build backend HTTP client")?;
        Ok(Self { backend })
    }
}

/// Build the router: `GET /` behind the tracing middleware.
pub fn build_router(state: Arc<AppState>, metrics: HttpMetrics) -> Router {
    Router::new()
        .route("/", get(service::greeting))
        .layer(middleware::from_fn_with_state(metrics, trace_request))
        .with_state(state)
}

/// Build the backend router: `GET /work` behind the tracing middleware.
pub fn build_work_router(state: Arc<WorkState>, metrics: HttpMetrics) -> Router {
    Router::new()
        .route("/work", get(service::work))
        .layer(middleware::from_fn_with_state(metrics, trace_request))
        .with_state(state)
}

/// Spawn a task flipping the returned receiver on SIGINT or SIGTERM.
pub fn shutdown_signal() -> watch::Receiver<bool> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        // Wait for SIGTERM or SIGINT (Ctrl+C)
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    tracing::error!(error = %e, "failed to install SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                _ = ctrl_c => {
                    tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating shutdown...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = ctrl_c.await {
                tracing::error!(error = %e, "failed to listen for ctrl+c");
                return;
            }
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }

        // Signal shutdown
        let _ = shutdown_tx.send(true);
    });

    shutdown_rx
}

/// Serve `router` on an already bound listener until `shutdown_rx` changes.
///
/// In-flight requests are drained before returning.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Starting HTTP server");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            // Wait for shutdown signal
            let _ = shutdown_rx.changed().await;
            tracing::info!("Shutdown signal received, stopping server");
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Bind `host:port`.
pub async fn bind(host: &str, port: u16) -> anyhow::Result<TcpListener> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))
}

/// Bind `config.host:config.port` and run the server.
///
/// # Arguments
///
/// * `config` - Server configuration
/// * `state` - Handler state
/// * `metrics` - Instruments for the request middleware
/// * `shutdown_rx` - Receiver for shutdown signal
pub async fn run_server(
    config: &Config,
    state: Arc<AppState>,
    metrics: HttpMetrics,
    shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let listener = bind(&config.host, config.port).await?;

    tracing::info!(backend = %state.backend.url(), "Forwarding GET / to backend");
    serve(listener, build_router(state, metrics), shutdown_rx).await?;
    Ok(())
}
