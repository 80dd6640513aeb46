//! Test fixtures and mock implementations for integration testing

use async_trait::async_trait;
use quickmatch::amqp::publisher::EventPublisher;
use quickmatch::error::{MatchmakingError, Result};
use quickmatch::types::{AmqpMessage, MatchFound, MatchPreferences, Player, QueueChanged};
use quickmatch::utils::current_timestamp;
use std::sync::{Arc, Mutex};

/// Mock event publisher that captures published events for testing
#[derive(Debug, Default)]
pub struct MockEventPublisher {
    published_events: Arc<Mutex<Vec<AmqpMessage>>>,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self {
            published_events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get all published events (for testing)
    pub fn get_published_events(&self) -> Vec<AmqpMessage> {
        self.published_events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Count events of specific type
    pub fn count_events_of_type(&self, event_type: &str) -> usize {
        self.get_published_events()
            .iter()
            .filter(|event| match event {
                AmqpMessage::QueueChanged(_) => event_type == "QueueChanged",
                AmqpMessage::MatchFound(_) => event_type == "MatchFound",
                _ => false,
            })
            .count()
    }

    /// All announced matches, in publication order
    pub fn announced_matches(&self) -> Vec<MatchFound> {
        self.get_published_events()
            .into_iter()
            .filter_map(|event| match event {
                AmqpMessage::MatchFound(found) => Some(found),
                _ => None,
            })
            .collect()
    }

    /// The queue depth carried by the most recent QueueChanged event
    pub fn last_announced_depth(&self) -> Option<usize> {
        self.get_published_events()
            .into_iter()
            .rev()
            .find_map(|event| match event {
                AmqpMessage::QueueChanged(changed) => Some(changed.queue_depth),
                _ => None,
            })
    }

    /// Clear published events (for testing)
    pub fn clear_events(&self) {
        if let Ok(mut events) = self.published_events.lock() {
            events.clear();
        }
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn announce_queue_changed(&self, event: QueueChanged) -> Result<()> {
        if let Ok(mut events) = self.published_events.lock() {
            events.push(AmqpMessage::QueueChanged(event));
        }
        Ok(())
    }

    async fn announce_match_found(&self, event: MatchFound) -> Result<()> {
        if let Ok(mut events) = self.published_events.lock() {
            events.push(AmqpMessage::MatchFound(event));
        }
        Ok(())
    }
}

/// Event publisher that fails every announcement, for verifying that
/// delivery failures never fail queue operations
#[derive(Debug, Default)]
pub struct FailingEventPublisher;

impl FailingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for FailingEventPublisher {
    async fn announce_queue_changed(&self, _event: QueueChanged) -> Result<()> {
        Err(MatchmakingError::AmqpConnectionFailed {
            message: "broker unavailable".to_string(),
        }
        .into())
    }

    async fn announce_match_found(&self, _event: MatchFound) -> Result<()> {
        Err(MatchmakingError::AmqpConnectionFailed {
            message: "broker unavailable".to_string(),
        }
        .into())
    }
}

/// Build a test player with no preference constraints
pub fn player(id: &str, rating: f64) -> Player {
    Player {
        id: id.to_string(),
        rating,
        preferences: MatchPreferences::any(),
        joined_at: current_timestamp(),
    }
}

/// Build a test player constrained to a difficulty
pub fn player_with_difficulty(id: &str, rating: f64, difficulty: &str) -> Player {
    Player {
        preferences: MatchPreferences::with_difficulty(difficulty),
        ..player(id, rating)
    }
}
