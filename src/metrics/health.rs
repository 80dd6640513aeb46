//! Health check endpoints and Prometheus metrics server
//!
//! This module provides the HTTP endpoints for health checks and Prometheus
//! metrics for the quickmatch service using Axum.

use crate::metrics::collector::MetricsCollector;
use crate::queue::coordinator::MatchCoordinator;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Health server configuration
#[derive(Debug, Clone)]
pub struct HealthServerConfig {
    /// Port to bind the health server to
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
}

impl Default for HealthServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Shared state for the health server
#[derive(Clone)]
pub struct HealthServerState {
    pub metrics_collector: Arc<MetricsCollector>,
    pub coordinator: Option<Arc<MatchCoordinator>>,
}

/// Health server that provides HTTP endpoints for monitoring
pub struct HealthServer {
    config: HealthServerConfig,
    state: HealthServerState,
    shutdown_tx: broadcast::Sender<()>,
    server_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl HealthServer {
    /// Create a new health server
    pub fn new(config: HealthServerConfig, metrics_collector: Arc<MetricsCollector>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state: HealthServerState {
                metrics_collector,
                coordinator: None,
            },
            shutdown_tx,
            server_handle: std::sync::Mutex::new(None),
        }
    }

    /// Attach the coordinator so health responses include queue statistics
    pub fn with_coordinator(mut self, coordinator: Arc<MatchCoordinator>) -> Self {
        self.state.coordinator = Some(coordinator);
        self
    }

    /// Start serving health and metrics endpoints
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid health server address")?;

        let router = Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(self.state.clone());

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind health server to {}", addr))?;

        info!("Health server listening on {}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await;

            if let Err(e) = result {
                error!("Health server error: {}", e);
            }
        });

        if let Ok(mut slot) = self.server_handle.lock() {
            *slot = Some(handle);
        }

        Ok(())
    }

    /// Stop the health server
    pub async fn stop(&self) -> Result<()> {
        let _ = self.shutdown_tx.send(());

        let handle = self
            .server_handle
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        info!("Health server stopped");
        Ok(())
    }
}

/// GET /health - service liveness plus queue statistics
async fn health_handler(State(state): State<HealthServerState>) -> Response {
    let (queue_depth, stats) = match &state.coordinator {
        Some(coordinator) => {
            let depth = coordinator.queue_depth().unwrap_or(0);
            let stats = coordinator.stats().unwrap_or_default();
            (depth, stats)
        }
        None => (0, Default::default()),
    };

    let body = json!({
        "status": "healthy",
        "timestamp": crate::utils::current_timestamp(),
        "queue_depth": queue_depth,
        "stats": {
            "players_queued": stats.players_queued,
            "players_left": stats.players_left,
            "players_expired": stats.players_expired,
            "matches_formed": stats.matches_formed,
        },
    });

    (StatusCode::OK, Json(body)).into_response()
}

/// GET /metrics - Prometheus text exposition
async fn metrics_handler(State(state): State<HealthServerState>) -> Response {
    match state.metrics_collector.gather() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}
