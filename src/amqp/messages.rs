//! AMQP message definitions and serialization

use crate::error::{MatchmakingError, Result};
use crate::types::*;
use serde_json;

/// AMQP queue names
pub const MATCH_REQUEST_QUEUE: &str = "matchmaking.requests";
pub const QUEUE_EVENTS_EXCHANGE: &str = "matchmaking.queue_events";

/// Routing keys for events
pub const QUEUE_CHANGED_ROUTING_KEY: &str = "queue.changed";
pub const MATCH_FOUND_ROUTING_KEY: &str = "match.found";

/// Message envelope with metadata
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MessageEnvelope<T> {
    pub payload: T,
    pub correlation_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub routing_key: String,
}

impl<T> MessageEnvelope<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    /// Create a new message envelope
    pub fn new(payload: T, routing_key: String) -> Self {
        Self {
            payload,
            correlation_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now(),
            routing_key,
        }
    }

    /// Serialize the envelope to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            MatchmakingError::InternalError {
                message: format!("Failed to serialize message: {}", e),
            }
            .into()
        })
    }

    /// Deserialize envelope from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            MatchmakingError::InvalidQueueRequest {
                reason: format!("Failed to deserialize message: {}", e),
            }
            .into()
        })
    }
}

/// Message serialization and validation utilities
pub struct MessageUtils;

impl MessageUtils {
    /// Deserialize an inbound request message from bytes.
    ///
    /// Field validation happens here, at the transport boundary; the queue
    /// itself assumes validated input.
    pub fn deserialize_request(bytes: &[u8]) -> Result<AmqpMessage> {
        let message: AmqpMessage =
            serde_json::from_slice(bytes).map_err(|e| MatchmakingError::InvalidQueueRequest {
                reason: format!("Failed to deserialize request: {}", e),
            })?;

        match &message {
            AmqpMessage::QueueRequest(request) => Self::validate_queue_request(request)?,
            AmqpMessage::LeaveRequest(request) => Self::validate_leave_request(request)?,
            AmqpMessage::QueueChanged(_) | AmqpMessage::MatchFound(_) => {
                return Err(MatchmakingError::InvalidQueueRequest {
                    reason: "Outbound event received on the request queue".to_string(),
                }
                .into());
            }
        }

        Ok(message)
    }

    /// Serialize a queue request to bytes
    pub fn serialize_queue_request(request: &QueueRequest) -> Result<Vec<u8>> {
        Self::validate_queue_request(request)?;
        serde_json::to_vec(&AmqpMessage::QueueRequest(request.clone())).map_err(|e| {
            MatchmakingError::InternalError {
                message: format!("Failed to serialize queue request: {}", e),
            }
            .into()
        })
    }

    /// Validate a queue request
    pub fn validate_queue_request(request: &QueueRequest) -> Result<()> {
        if request.player_id.is_empty() {
            return Err(MatchmakingError::InvalidQueueRequest {
                reason: "Player ID cannot be empty".to_string(),
            }
            .into());
        }

        if !request.rating.is_finite() {
            return Err(MatchmakingError::InvalidQueueRequest {
                reason: format!("Rating must be a finite number, got {}", request.rating),
            }
            .into());
        }

        Ok(())
    }

    /// Validate a leave request
    pub fn validate_leave_request(request: &LeaveRequest) -> Result<()> {
        if request.player_id.is_empty() {
            return Err(MatchmakingError::InvalidQueueRequest {
                reason: "Player ID cannot be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Serialize any AMQP message to bytes
    pub fn serialize_message<T: serde::Serialize>(message: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(message).map_err(|e| {
            MatchmakingError::InternalError {
                message: format!("Failed to serialize message: {}", e),
            }
            .into()
        })
    }

    /// Get routing key for a message type
    pub fn get_routing_key(message: &AmqpMessage) -> &'static str {
        match message {
            AmqpMessage::QueueRequest(_) => "queue.request",
            AmqpMessage::LeaveRequest(_) => "queue.leave",
            AmqpMessage::QueueChanged(_) => QUEUE_CHANGED_ROUTING_KEY,
            AmqpMessage::MatchFound(_) => MATCH_FOUND_ROUTING_KEY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use crate::utils::current_timestamp;

    fn create_test_queue_request() -> QueueRequest {
        QueueRequest {
            player_id: "test_player".to_string(),
            rating: 1500.0,
            preferences: MatchPreferences::any(),
            timestamp: current_timestamp(),
        }
    }

    #[test]
    fn test_message_envelope_creation() {
        let request = create_test_queue_request();
        let envelope = MessageEnvelope::new(request, "test.routing.key".to_string());

        assert_eq!(envelope.routing_key, "test.routing.key");
        assert!(!envelope.correlation_id.is_empty());
    }

    #[test]
    fn test_queue_request_validation() {
        let valid_request = create_test_queue_request();
        assert!(MessageUtils::validate_queue_request(&valid_request).is_ok());

        // Empty player ID
        let mut invalid_request = create_test_queue_request();
        invalid_request.player_id = "".to_string();
        assert!(MessageUtils::validate_queue_request(&invalid_request).is_err());

        // Non-finite rating
        let mut invalid_request = create_test_queue_request();
        invalid_request.rating = f64::NAN;
        assert!(MessageUtils::validate_queue_request(&invalid_request).is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let request = create_test_queue_request();
        let bytes = MessageUtils::serialize_queue_request(&request).unwrap();
        let deserialized = MessageUtils::deserialize_request(&bytes).unwrap();

        match deserialized {
            AmqpMessage::QueueRequest(parsed) => {
                assert_eq!(request.player_id, parsed.player_id);
                assert_eq!(request.rating, parsed.rating);
                assert_eq!(request.preferences, parsed.preferences);
            }
            other => panic!("Expected QueueRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_outbound_event_rejected_on_request_queue() {
        let event = AmqpMessage::QueueChanged(QueueChanged {
            queue_depth: 3,
            timestamp: current_timestamp(),
        });
        let bytes = MessageUtils::serialize_message(&event).unwrap();

        assert!(MessageUtils::deserialize_request(&bytes).is_err());
    }

    #[test]
    fn test_routing_key_generation() {
        let queue_request = AmqpMessage::QueueRequest(create_test_queue_request());
        assert_eq!(
            MessageUtils::get_routing_key(&queue_request),
            "queue.request"
        );

        let match_found = AmqpMessage::MatchFound(MatchFound {
            match_record: Match::new(
                Player {
                    id: "a".to_string(),
                    rating: 1000.0,
                    preferences: MatchPreferences::any(),
                    joined_at: current_timestamp(),
                },
                Player {
                    id: "b".to_string(),
                    rating: 1010.0,
                    preferences: MatchPreferences::any(),
                    joined_at: current_timestamp(),
                },
            ),
            timestamp: current_timestamp(),
        });
        assert_eq!(
            MessageUtils::get_routing_key(&match_found),
            MATCH_FOUND_ROUTING_KEY
        );
    }
}
