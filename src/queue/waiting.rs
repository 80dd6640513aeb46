//! Waiting queue implementation and pairing logic
//!
//! This module owns the pool of players waiting for a match. It supports
//! insert-or-replace joins, explicit removal, idle expiry, and the greedy
//! nearest-skill-neighbor pairing scan.
//!
//! The queue itself is not synchronized; callers serialize access (the
//! coordinator wraps one instance per pool in a mutex).

use crate::queue::matching::players_compatible;
use crate::types::Player;
use crate::utils::current_timestamp;
use chrono::{DateTime, Duration, Utc};

/// Default idle timeout before a waiting player is expired
pub const DEFAULT_IDLE_TIMEOUT_MS: i64 = 30_000;

/// Pool of players waiting to be paired.
///
/// Pairing is greedy: the pool is sorted by ascending rating and the first
/// adjacent pair with compatible preferences wins. A player can sit next to
/// an incompatible neighbor even when a compatible partner exists further
/// along the sorted order; that pairing waits for the pool to shift.
#[derive(Debug, Clone)]
pub struct WaitingQueue {
    entries: Vec<Player>,
    idle_timeout: Duration,
}

impl Default for WaitingQueue {
    fn default() -> Self {
        Self::new(Duration::milliseconds(DEFAULT_IDLE_TIMEOUT_MS))
    }
}

impl WaitingQueue {
    /// Create a queue with the given idle timeout
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            entries: Vec::new(),
            idle_timeout,
        }
    }

    /// Create a queue with an idle timeout given in milliseconds
    pub fn with_timeout_ms(timeout_ms: i64) -> Self {
        Self::new(Duration::milliseconds(timeout_ms))
    }

    /// Number of players currently waiting
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether a player is currently queued
    pub fn contains(&self, player_id: &str) -> bool {
        self.entries.iter().any(|p| p.id == player_id)
    }

    /// Snapshot of the waiting players
    pub fn players(&self) -> Vec<Player> {
        self.entries.clone()
    }

    /// Configured idle timeout
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Insert a player, replacing any existing entry with the same id.
    ///
    /// The entry is stamped with the current time; a re-join refreshes
    /// `joined_at` rather than duplicating the player.
    pub fn add_player(&mut self, mut player: Player) {
        self.entries.retain(|p| p.id != player.id);
        player.joined_at = current_timestamp();
        self.entries.push(player);
    }

    /// Remove a player by id. Returns the removed entry, or `None` if the
    /// player was not queued.
    pub fn remove_player(&mut self, player_id: &str) -> Option<Player> {
        let mut removed = None;
        self.entries.retain(|p| {
            if p.id == player_id {
                removed = Some(p.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Remove every entry that has been waiting for the idle timeout or
    /// longer, returning the expired players.
    pub fn expire_idle(&mut self, now: DateTime<Utc>) -> Vec<Player> {
        let timeout = self.idle_timeout;
        let mut expired = Vec::new();
        self.entries.retain(|p| {
            if now - p.joined_at >= timeout {
                expired.push(p.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Attempt to pair two players.
    ///
    /// Stale entries are expired first so they can never match. The pool is
    /// then sorted by ascending rating (ties broken by join time, then id,
    /// so the scan order is reproducible) and adjacent pairs are scanned in
    /// order; the first compatible pair is removed from the queue and
    /// returned. Returns `None` when no compatible adjacent pair exists.
    pub fn find_match(&mut self, now: DateTime<Utc>) -> Option<(Player, Player)> {
        self.expire_idle(now);

        if self.entries.len() < 2 {
            return None;
        }

        self.entries.sort_by(|a, b| {
            a.rating
                .partial_cmp(&b.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.joined_at.cmp(&b.joined_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        for i in 0..self.entries.len() - 1 {
            if players_compatible(&self.entries[i], &self.entries[i + 1]) {
                // Remove the higher index first so the lower stays valid
                let second = self.entries.remove(i + 1);
                let first = self.entries.remove(i);
                return Some((first, second));
            }
        }

        None
    }

    /// Ids of the waiting players, in current storage order
    #[cfg(test)]
    fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|p| p.id.clone()).collect()
    }
}
