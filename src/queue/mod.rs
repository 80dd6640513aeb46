//! Waiting queue and pairing engine for the matchmaking service
//!
//! This module owns the in-memory pool of waiting players, the pairing
//! policy, the coordinator that ties them to the notification channel, and
//! the periodic ticker that re-attempts pairing.

pub mod coordinator;
pub mod matching;
pub mod ticker;
pub mod waiting;

// Re-export commonly used types
pub use coordinator::{CoordinatorStats, MatchCoordinator};
pub use matching::{players_compatible, preferences_compatible};
pub use ticker::{QueueTicker, TickerConfig};
pub use waiting::{WaitingQueue, DEFAULT_IDLE_TIMEOUT_MS};
