//! Periodic expire-and-pair driver
//!
//! Players who arrive when no compatible partner exists stay queued; this
//! task re-runs the pairing cycle on a fixed interval so they still get
//! matched once a partner shows up, without needing a new join event.

use crate::queue::coordinator::MatchCoordinator;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

/// Configuration for the periodic ticker
#[derive(Debug, Clone)]
pub struct TickerConfig {
    /// Interval between expire+pair cycles
    pub tick_interval: Duration,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
        }
    }
}

/// Handle to a running ticker task
pub struct QueueTicker {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl QueueTicker {
    /// Spawn the ticker task for the given coordinator
    pub fn spawn(coordinator: Arc<MatchCoordinator>, config: TickerConfig) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(config.tick_interval);
            info!(
                "Queue ticker started - interval: {:?}",
                config.tick_interval
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match coordinator.tick().await {
                            Ok(matches) if !matches.is_empty() => {
                                info!("Ticker resolved {} match(es)", matches.len());
                            }
                            Ok(_) => {
                                debug!("Ticker cycle completed - no matches");
                            }
                            Err(e) => {
                                error!("Ticker cycle failed: {}", e);
                            }
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        // A closed channel means the handle is gone; stop
                        // either way
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Queue ticker shutting down");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            handle,
            shutdown_tx,
        }
    }

    /// Signal the ticker to stop and wait for the task to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }

    /// Abort the ticker without waiting
    pub fn abort(&self) {
        self.handle.abort();
    }
}
