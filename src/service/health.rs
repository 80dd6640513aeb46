//! Health check reporting for the service
//!
//! This module provides the health snapshot used by the CLI health-check
//! mode and the periodic health logging task.

use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Players currently waiting in the queue
    pub queue_depth: usize,
    /// Total join requests processed since start
    pub players_queued: u64,
    /// Total entries dropped by idle expiry
    pub players_expired: u64,
    /// Total matches formed since start
    pub matches_formed: u64,
    /// Service uptime information
    pub uptime_info: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Service statistics
    pub stats: ServiceStats,
}

impl HealthCheck {
    /// Perform a health check of the service
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        // A responsive queue lock means the engine can still take requests;
        // a poisoned lock means a pairing attempt panicked and the engine
        // is wedged
        let (status, queue_depth, coordinator_stats) = match app_state.coordinator().queue_depth() {
            Ok(depth) => {
                let stats = app_state.coordinator().stats().unwrap_or_default();
                (HealthStatus::Healthy, depth, stats)
            }
            Err(_) => (HealthStatus::Unhealthy, 0, Default::default()),
        };

        let uptime = chrono::Utc::now() - app_state.started_at();

        Ok(HealthCheck {
            status,
            service: app_state.config().service.name.clone(),
            timestamp: chrono::Utc::now(),
            stats: ServiceStats {
                queue_depth,
                players_queued: coordinator_stats.players_queued,
                players_expired: coordinator_stats.players_expired,
                matches_formed: coordinator_stats.matches_formed,
                uptime_info: format!("{}s", uptime.num_seconds()),
            },
        })
    }
}
