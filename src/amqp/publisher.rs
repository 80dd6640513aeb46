//! AMQP event publisher for outbound events

use crate::amqp::messages::{
    MessageEnvelope, MATCH_FOUND_ROUTING_KEY, QUEUE_CHANGED_ROUTING_KEY, QUEUE_EVENTS_EXCHANGE,
};
use crate::error::{MatchmakingError, Result};
use crate::types::*;
use amqprs::{
    channel::{BasicPublishArguments, Channel, ExchangeDeclareArguments},
    BasicProperties,
};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Trait for announcing matchmaking events.
///
/// The coordinator treats announcements as fire-and-forget; implementors
/// own the delivery guarantees (or lack of them).
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Announce that the waiting pool changed (size, membership)
    async fn announce_queue_changed(&self, event: QueueChanged) -> Result<()>;

    /// Announce a formed match with the full match payload
    async fn announce_match_found(&self, event: MatchFound) -> Result<()>;
}

/// Configuration for event publishing
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub enable_deduplication: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 500,
            enable_deduplication: true,
        }
    }
}

/// AMQP-based event publisher implementation
pub struct AmqpEventPublisher {
    channel: Channel,
    config: PublisherConfig,
    published_messages: std::sync::Mutex<std::collections::HashSet<String>>, // For deduplication
}

impl AmqpEventPublisher {
    /// Create a new event publisher
    pub async fn new(channel: Channel, config: PublisherConfig) -> Result<Self> {
        let publisher = Self {
            channel,
            config,
            published_messages: std::sync::Mutex::new(std::collections::HashSet::new()),
        };

        publisher.setup_exchanges().await?;

        Ok(publisher)
    }

    /// Set up the AMQP exchange for queue events
    async fn setup_exchanges(&self) -> Result<()> {
        let args = ExchangeDeclareArguments::new(QUEUE_EVENTS_EXCHANGE, "topic");
        self.channel.exchange_declare(args).await.map_err(|e| {
            MatchmakingError::AmqpConnectionFailed {
                message: format!("Failed to declare queue events exchange: {}", e),
            }
        })?;

        debug!("Declared AMQP exchange '{}'", QUEUE_EVENTS_EXCHANGE);
        Ok(())
    }

    /// Generic method to publish to an exchange with retry logic
    async fn publish_to_exchange<T>(
        &self,
        exchange: &str,
        envelope: &MessageEnvelope<T>,
    ) -> Result<()>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Clone,
    {
        // Check for deduplication
        if self.config.enable_deduplication {
            let published_messages =
                self.published_messages
                    .lock()
                    .map_err(|_| MatchmakingError::InternalError {
                        message: "Failed to acquire published messages lock".to_string(),
                    })?;
            if published_messages.contains(&envelope.correlation_id) {
                debug!(
                    "Message {} already published, skipping",
                    envelope.correlation_id
                );
                return Ok(());
            }
        }

        let mut retry_count = 0;
        let mut delay = Duration::from_millis(self.config.retry_delay_ms);

        loop {
            match self.try_publish(exchange, envelope).await {
                Ok(_) => {
                    if self.config.enable_deduplication {
                        let mut published_messages =
                            self.published_messages.lock().map_err(|_| {
                                MatchmakingError::InternalError {
                                    message: "Failed to acquire published messages lock"
                                        .to_string(),
                                }
                            })?;
                        published_messages.insert(envelope.correlation_id.clone());
                    }

                    debug!(
                        "Successfully published message {} to exchange {}",
                        envelope.correlation_id, exchange
                    );
                    return Ok(());
                }
                Err(e) => {
                    retry_count += 1;
                    if retry_count > self.config.max_retries {
                        error!(
                            "Failed to publish message {} after {} retries: {}",
                            envelope.correlation_id, self.config.max_retries, e
                        );
                        return Err(e);
                    }

                    warn!(
                        "Publish attempt {} failed for message {}: {}. Retrying in {:?}",
                        retry_count, envelope.correlation_id, e, delay
                    );

                    sleep(delay).await;
                    delay = Duration::from_millis((delay.as_millis() as u64 * 2).min(5000));
                }
            }
        }
    }

    /// Single publish attempt
    async fn try_publish<T>(&self, exchange: &str, envelope: &MessageEnvelope<T>) -> Result<()>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        let payload = envelope.to_bytes()?;

        let args = BasicPublishArguments::new(exchange, &envelope.routing_key);
        let mut properties = BasicProperties::default();
        properties
            .with_message_id(&envelope.correlation_id)
            .with_timestamp(envelope.timestamp.timestamp() as u64)
            .with_content_type("application/json");

        self.channel
            .basic_publish(properties, payload, args)
            .await
            .map_err(|e| MatchmakingError::AmqpConnectionFailed {
                message: format!("Failed to publish message: {}", e),
            })?;

        Ok(())
    }

    /// Clear deduplication cache (useful for testing or memory management)
    pub fn clear_deduplication_cache(&self) {
        if let Ok(mut published_messages) = self.published_messages.lock() {
            published_messages.clear();
        }
    }

    /// Get number of cached message IDs (for monitoring)
    pub fn cached_message_count(&self) -> usize {
        self.published_messages
            .lock()
            .map(|cache| cache.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventPublisher for AmqpEventPublisher {
    async fn announce_queue_changed(&self, event: QueueChanged) -> Result<()> {
        let envelope = MessageEnvelope::new(event, QUEUE_CHANGED_ROUTING_KEY.to_string());
        self.publish_to_exchange(QUEUE_EVENTS_EXCHANGE, &envelope)
            .await
    }

    async fn announce_match_found(&self, event: MatchFound) -> Result<()> {
        let envelope = MessageEnvelope::new(event, MATCH_FOUND_ROUTING_KEY.to_string());
        self.publish_to_exchange(QUEUE_EVENTS_EXCHANGE, &envelope)
            .await
    }
}

/// Mock event publisher for testing
#[derive(Debug, Default)]
pub struct MockEventPublisher {
    published_events: std::sync::Mutex<Vec<AmqpMessage>>,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self::default()
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
