//! Common types used throughout the matchmaking service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for matches
pub type MatchId = Uuid;

/// Optional matching constraints a player carries into the queue.
///
/// An unset axis means "no constraint on that axis": the player accepts
/// any value the other side brings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_type: Option<String>,
}

impl MatchPreferences {
    /// Preferences with no constraints on either axis
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_difficulty(difficulty: impl Into<String>) -> Self {
        Self {
            difficulty: Some(difficulty.into()),
            game_type: None,
        }
    }

    pub fn with_game_type(game_type: impl Into<String>) -> Self {
        Self {
            difficulty: None,
            game_type: Some(game_type.into()),
        }
    }
}

/// Player information held only while queued
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub rating: f64,
    pub preferences: MatchPreferences,
    pub joined_at: DateTime<Utc>,
}

/// An immutable match record handed off to the caller at pairing time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub players: [Player; 2],
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Create a match record for two paired players
    pub fn new(first: Player, second: Player) -> Self {
        Self {
            id: crate::utils::generate_match_id(),
            players: [first, second],
            created_at: crate::utils::current_timestamp(),
        }
    }

    /// Check whether the given player is part of this match
    pub fn contains_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }
}

/// AMQP Message Types
/// Request to join the matchmaking queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueRequest {
    pub player_id: PlayerId,
    pub rating: f64,
    #[serde(default)]
    pub preferences: MatchPreferences,
    pub timestamp: DateTime<Utc>,
}

/// Request to leave the queue (explicit quit or transport disconnect)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub player_id: PlayerId,
    pub timestamp: DateTime<Utc>,
}

/// Event emitted whenever the waiting pool changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueChanged {
    pub queue_depth: usize,
    pub timestamp: DateTime<Utc>,
}

/// Event emitted when two players have been paired
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchFound {
    pub match_record: Match,
    pub timestamp: DateTime<Utc>,
}

/// Union type for all AMQP messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AmqpMessage {
    QueueRequest(QueueRequest),
    LeaveRequest(LeaveRequest),
    QueueChanged(QueueChanged),
    MatchFound(MatchFound),
}
