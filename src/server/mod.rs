//! HTTP proxy in front of the Serena MCP server
//!
//! `serena serve` exposes every client operation as a JSON route so that
//! tools without an MCP client can use Serena. One [`SerenaConnector`] is
//! shared by all requests; a background task probes it on an interval and
//! reconnects once the circuit allows.

pub mod response;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::connector::{CircuitState, SerenaConnector};
use crate::error::{Result, SerenaError};

/// Shared state for route handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub connector: Arc<SerenaConnector>,
}

/// Build the proxy router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/help", get(routes::help))
        .route("/health", get(routes::health))
        // Status and activation
        .route("/status", get(routes::status))
        .route("/activate", post(routes::activate))
        // Symbols and search
        .route("/find", get(routes::find))
        .route("/refs", get(routes::refs))
        .route("/overview", get(routes::overview))
        .route("/search", get(routes::search))
        .route("/recipe", get(routes::recipe))
        .route("/tools", get(routes::tools))
        // Memory
        .route("/memory/list", get(routes::memory_list))
        .route("/memory/read", get(routes::memory_read))
        .route("/memory/tree", get(routes::memory_tree))
        .route("/memory/search", get(routes::memory_search))
        .route("/memory/stats", get(routes::memory_stats))
        .route("/memory/write", post(routes::memory_write))
        .route("/memory/delete", post(routes::memory_delete))
        .route("/memory/move", post(routes::memory_move))
        .route("/memory/archive", post(routes::memory_archive))
        // Editing
        .route("/edit/replace", post(routes::edit_replace))
        .route("/edit/after", post(routes::edit_after))
        .route("/edit/before", post(routes::edit_before))
        .route("/edit/rename", post(routes::edit_rename))
        // Onboarding
        .route("/check_onboarding", get(routes::check_onboarding))
        .route("/onboarding", get(routes::onboarding))
        .route("/init_memories", post(routes::init_memories))
        .with_state(state)
}

/// One health-monitor step: reconnect when there is no client and the
/// circuit is not open, otherwise probe the client.
pub async fn monitor_tick(connector: &SerenaConnector) {
    if !connector.has_client() {
        if connector.circuit_state() == CircuitState::Open {
            tracing::debug!("circuit open, skipping reconnect");
            return;
        }
        if let Err(e) = connector.connect().await {
            tracing::warn!("Serena: reconnect failed: {}", e);
        }
        return;
    }
    connector.check_health().await;
}

/// Run [`monitor_tick`] every `interval` until the task is aborted.
pub fn spawn_health_monitor(connector: Arc<SerenaConnector>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; the connect in `serve` covers it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            monitor_tick(&connector).await;
        }
    })
}

/// Connect, serve until Ctrl+C, then disconnect.
///
/// A failed initial connect is logged and the proxy starts anyway; routes
/// answer 503 until the health monitor reconnects.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn serve(config: Config) -> Result<()> {
    let connector = Arc::new(SerenaConnector::from_config(&config));

    match connector.connect().await {
        Ok(()) => tracing::info!("Serena: connected"),
        Err(e) => tracing::warn!("Serena: connection failed: {}", e),
    }

    let monitor = spawn_health_monitor(
        Arc::clone(&connector),
        Duration::from_secs(config.connector.health_interval_seconds),
    );

    let addr = format!("{}:{}", config.proxy.host, config.proxy.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SerenaError::Config(format!("Cannot bind {}: {}", addr, e)))?;
    tracing::info!(addr = %addr, upstream = %config.server.url, "Serena proxy listening");

    let app = build_router(AppState {
        connector: Arc::clone(&connector),
    });
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    monitor.abort();
    connector.disconnect();
    tracing::info!("Serena proxy stopped");
    served.map_err(Into::into)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
