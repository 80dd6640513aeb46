//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the quickmatch service:
//! queue activity counters, the live queue depth gauge, and request
//! processing latency.

use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Queue activity metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Total join requests processed
    pub players_queued_total: IntCounter,

    /// Total explicit leaves
    pub players_left_total: IntCounter,

    /// Total entries dropped by idle expiry
    pub players_expired_total: IntCounter,

    /// Total matches formed
    pub matches_formed_total: IntCounter,

    /// Players currently waiting
    pub queue_depth: IntGauge,

    /// Join request processing time
    pub join_duration_seconds: Histogram,
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let players_queued_total = IntCounter::with_opts(Opts::new(
            "quickmatch_players_queued_total",
            "Total join requests processed",
        ))?;
        registry.register(Box::new(players_queued_total.clone()))?;

        let players_left_total = IntCounter::with_opts(Opts::new(
            "quickmatch_players_left_total",
            "Total explicit queue leaves",
        ))?;
        registry.register(Box::new(players_left_total.clone()))?;

        let players_expired_total = IntCounter::with_opts(Opts::new(
            "quickmatch_players_expired_total",
            "Total waiting entries dropped by idle expiry",
        ))?;
        registry.register(Box::new(players_expired_total.clone()))?;

        let matches_formed_total = IntCounter::with_opts(Opts::new(
            "quickmatch_matches_formed_total",
            "Total matches formed",
        ))?;
        registry.register(Box::new(matches_formed_total.clone()))?;

        let queue_depth = IntGauge::with_opts(Opts::new(
            "quickmatch_queue_depth",
            "Players currently waiting for a match",
        ))?;
        registry.register(Box::new(queue_depth.clone()))?;

        let join_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "quickmatch_join_duration_seconds",
                "Join request processing time in seconds",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(join_duration_seconds.clone()))?;

        Ok(Self {
            players_queued_total,
            players_left_total,
            players_expired_total,
            matches_formed_total,
            queue_depth,
            join_duration_seconds,
        })
    }
}

/// Main metrics collector for the matchmaking service
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,
    queue_metrics: QueueMetrics,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let queue_metrics = QueueMetrics::new(&registry)?;

        Ok(Self {
            registry: Arc::new(registry),
            queue_metrics,
        })
    }

    /// Direct access to the queue metrics
    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    /// Record a processed join request and its latency
    pub fn record_queue_request(&self, duration: Duration) {
        self.queue_metrics.players_queued_total.inc();
        self.queue_metrics
            .join_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record an explicit leave
    pub fn record_leave(&self) {
        self.queue_metrics.players_left_total.inc();
    }

    /// Record a batch of idle expirations
    pub fn record_expired(&self, count: usize) {
        self.queue_metrics.players_expired_total.inc_by(count as u64);
    }

    /// Record a formed match
    pub fn record_match_formed(&self) {
        self.queue_metrics.matches_formed_total.inc();
    }

    /// Update the live queue depth gauge
    pub fn set_queue_depth(&self, depth: usize) {
        self.queue_metrics.queue_depth.set(depth as i64);
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        Ok(encoder.encode_to_string(&metric_families)?)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        // Registration against a fresh registry only fails on duplicate
        // names, which cannot happen here
        Self::new().expect("failed to build default metrics collector")
    }
}
