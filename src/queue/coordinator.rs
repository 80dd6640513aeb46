//! Matchmaking coordinator orchestrating the waiting queue
//!
//! This module provides the single entry point used by the transport layer:
//! a join request is queued, a pairing attempt runs immediately, and queue
//! updates and found matches are announced to the notification channel.

use crate::amqp::publisher::EventPublisher;
use crate::error::{MatchmakingError, Result};
use crate::metrics::MetricsCollector;
use crate::queue::waiting::WaitingQueue;
use crate::types::{Match, MatchFound, Player, QueueChanged};
use crate::utils::current_timestamp;
use std::sync::{Arc, Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Statistics about coordinator operations
#[derive(Debug, Clone, Default)]
pub struct CoordinatorStats {
    /// Total number of join requests processed
    pub players_queued: u64,
    /// Total number of explicit leaves
    pub players_left: u64,
    /// Total number of entries dropped by idle expiry
    pub players_expired: u64,
    /// Total number of matches formed
    pub matches_formed: u64,
}

/// The matchmaking coordinator.
///
/// Owns one waiting queue (one pool) behind a mutex so that concurrent
/// joins, leaves, and ticks never observe a half-applied mutation. The lock
/// is held across the whole expire+sort+scan of a pairing attempt, which is
/// fine: the queue is in-memory and the scan is O(n log n), never an I/O
/// wait. The lock is released before any announcement goes out.
#[derive(Clone)]
pub struct MatchCoordinator {
    /// The waiting pool, serialized behind a single mutex
    queue: Arc<Mutex<WaitingQueue>>,
    /// Sink for queue-changed and match-found announcements
    event_publisher: Arc<dyn EventPublisher>,
    /// Coordinator statistics
    stats: Arc<RwLock<CoordinatorStats>>,
    /// Metrics collector for recording queue activity
    metrics_collector: Arc<MetricsCollector>,
}

impl MatchCoordinator {
    /// Create a new coordinator around the given queue
    pub fn new(queue: WaitingQueue, event_publisher: Arc<dyn EventPublisher>) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(queue, event_publisher, metrics_collector)
    }

    /// Create a new coordinator with an explicit metrics collector
    pub fn with_metrics(
        queue: WaitingQueue,
        event_publisher: Arc<dyn EventPublisher>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            queue: Arc::new(Mutex::new(queue)),
            event_publisher,
            stats: Arc::new(RwLock::new(CoordinatorStats::default())),
            metrics_collector,
        }
    }

    /// Handle a join request.
    ///
    /// The player is queued (replacing any prior entry with the same id)
    /// and one pairing attempt runs immediately. Returns the match if one
    /// formed; otherwise the player stays queued for a future arrival or
    /// tick. A join never fails for lack of a partner.
    pub async fn join_queue(&self, player: Player) -> Result<Option<Match>> {
        let start_time = Instant::now();
        let player_id = player.id.clone();

        info!(
            "Processing join request - player_id: '{}', rating: {:.1}, preferences: {:?}",
            player_id, player.rating, player.preferences
        );

        let (pair, expired, depth) = {
            let mut queue = self.lock_queue()?;
            queue.add_player(player);

            let now = current_timestamp();
            let expired = queue.expire_idle(now);
            let pair = queue.find_match(now);
            (pair, expired, queue.depth())
        };

        self.record_expired(&expired)?;

        let matched = pair.map(|(first, second)| Match::new(first, second));

        {
            let mut stats = self.lock_stats_mut()?;
            stats.players_queued += 1;
            if matched.is_some() {
                stats.matches_formed += 1;
            }
        }

        self.metrics_collector
            .record_queue_request(start_time.elapsed());
        self.metrics_collector.set_queue_depth(depth);

        if let Some(ref matched) = matched {
            self.metrics_collector.record_match_formed();
            info!(
                "Match {} formed - players: ['{}', '{}'], queue_depth: {}",
                matched.id, matched.players[0].id, matched.players[1].id, depth
            );
        } else {
            debug!(
                "No match for player '{}' yet - queue_depth: {}",
                player_id, depth
            );
        }

        // Announcements are fire-and-forget: a delivery failure never
        // fails the join
        self.announce_queue_changed(depth).await;
        if let Some(ref matched) = matched {
            self.announce_match_found(matched).await;
        }

        Ok(matched)
    }

    /// Remove a player from the queue. Returns whether an entry existed.
    pub async fn leave_queue(&self, player_id: &str) -> Result<bool> {
        let (removed, depth) = {
            let mut queue = self.lock_queue()?;
            let removed = queue.remove_player(player_id);
            (removed, queue.depth())
        };

        if removed.is_some() {
            let mut stats = self.lock_stats_mut()?;
            stats.players_left += 1;

            self.metrics_collector.record_leave();
            self.metrics_collector.set_queue_depth(depth);
            info!(
                "Player '{}' left the queue - queue_depth: {}",
                player_id, depth
            );
        } else {
            debug!("Leave request for unqueued player '{}'", player_id);
        }

        self.announce_queue_changed(depth).await;
        Ok(removed.is_some())
    }

    /// Run one expire+pair cycle.
    ///
    /// Stale entries are expired, then pairing repeats until no further
    /// adjacent pair is compatible; a single tick can resolve several pairs
    /// when the pool is large. Returns the matches formed.
    pub async fn tick(&self) -> Result<Vec<Match>> {
        let (pairs, expired, depth) = {
            let mut queue = self.lock_queue()?;
            let now = current_timestamp();
            let expired = queue.expire_idle(now);

            let mut pairs = Vec::new();
            while let Some(pair) = queue.find_match(now) {
                pairs.push(pair);
            }
            (pairs, expired, queue.depth())
        };

        self.record_expired(&expired)?;

        let matches: Vec<Match> = pairs
            .into_iter()
            .map(|(first, second)| Match::new(first, second))
            .collect();

        if !matches.is_empty() {
            let mut stats = self.lock_stats_mut()?;
            stats.matches_formed += matches.len() as u64;

            info!(
                "Tick formed {} match(es) - queue_depth: {}",
                matches.len(),
                depth
            );
        }

        self.metrics_collector.set_queue_depth(depth);

        for matched in &matches {
            self.metrics_collector.record_match_formed();
            self.announce_match_found(matched).await;
        }
        self.announce_queue_changed(depth).await;

        Ok(matches)
    }

    /// Current number of waiting players
    pub fn queue_depth(&self) -> Result<usize> {
        Ok(self.lock_queue()?.depth())
    }

    /// Snapshot of coordinator statistics
    pub fn stats(&self) -> Result<CoordinatorStats> {
        let stats = self
            .stats
            .read()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;
        Ok(stats.clone())
    }

    fn lock_queue(&self) -> Result<std::sync::MutexGuard<'_, WaitingQueue>> {
        self.queue
            .lock()
            .map_err(|_| {
                MatchmakingError::InternalError {
                    message: "Failed to acquire queue lock".to_string(),
                }
                .into()
            })
    }

    fn lock_stats_mut(&self) -> Result<std::sync::RwLockWriteGuard<'_, CoordinatorStats>> {
        self.stats
            .write()
            .map_err(|_| {
                MatchmakingError::InternalError {
                    message: "Failed to acquire stats lock".to_string(),
                }
                .into()
            })
    }

    fn record_expired(&self, expired: &[Player]) -> Result<()> {
        if expired.is_empty() {
            return Ok(());
        }

        for player in expired {
            info!(
                "Expired idle player '{}' (joined at {})",
                player.id, player.joined_at
            );
        }

        let mut stats = self.lock_stats_mut()?;
        stats.players_expired += expired.len() as u64;
        drop(stats);

        self.metrics_collector.record_expired(expired.len());
        Ok(())
    }

    async fn announce_queue_changed(&self, depth: usize) {
        let event = QueueChanged {
            queue_depth: depth,
            timestamp: current_timestamp(),
        };

        if let Err(e) = self.event_publisher.announce_queue_changed(event).await {
            warn!("Failed to announce queue change: {}", e);
        }
    }

    async fn announce_match_found(&self, matched: &Match) {
        let event = MatchFound {
            match_record: matched.clone(),
            timestamp: current_timestamp(),
        };

        if let Err(e) = self.event_publisher.announce_match_found(event).await {
            warn!(
                "Failed to announce match {} - players will learn of it on reconnect: {}",
                matched.id, e
            );
        }
    }
}
