//! AMQP message handlers for processing inbound queue traffic
//!
//! This module provides the message handling infrastructure for the
//! matchmaking service: request deserialization, dispatch to the handler,
//! and error reporting.

use crate::amqp::messages::MessageUtils;
use crate::error::{MatchmakingError, Result};
use crate::types::{AmqpMessage, LeaveRequest, QueueRequest};
use amqprs::{
    channel::{BasicCancelArguments, BasicConsumeArguments, Channel},
    consumer::AsyncConsumer,
    BasicProperties, Deliver,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Trait defining the interface for handling inbound AMQP messages
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle a join request from a player
    async fn handle_queue_request(&self, request: QueueRequest) -> Result<()>;

    /// Handle a leave request (explicit quit or disconnect)
    async fn handle_leave_request(&self, request: LeaveRequest) -> Result<()>;

    /// Handle processing errors
    async fn handle_error(&self, error: MatchmakingError, message_data: &[u8]);
}

/// Consumer for the matchmaking request queue
pub struct RequestConsumer {
    handler: Arc<dyn MessageHandler>,
    channel: Channel,
    consumer_tag: String,
}

impl RequestConsumer {
    /// Create a new request consumer
    pub fn new(handler: Arc<dyn MessageHandler>, channel: Channel) -> Self {
        let consumer_tag = format!("match-consumer-{}", uuid::Uuid::new_v4());

        Self {
            handler,
            channel,
            consumer_tag,
        }
    }

    /// Start consuming messages from the queue
    pub async fn start_consuming(&self, queue_name: &str) -> Result<()> {
        let args = BasicConsumeArguments::new(queue_name, &self.consumer_tag);

        self.channel
            .basic_consume(InboundConsumer::new(self.handler.clone()), args)
            .await
            .map_err(|e| MatchmakingError::AmqpConnectionFailed {
                message: format!("Failed to start consuming: {}", e),
            })?;

        info!("Started consuming messages from queue: {}", queue_name);
        Ok(())
    }

    /// Stop consuming messages
    pub async fn stop_consuming(&self) -> Result<()> {
        let args = BasicCancelArguments::new(&self.consumer_tag);

        self.channel.basic_cancel(args).await.map_err(|e| {
            MatchmakingError::AmqpConnectionFailed {
                message: format!("Failed to stop consuming: {}", e),
            }
        })?;

        info!("Stopped consuming messages");
        Ok(())
    }
}

/// Internal consumer implementation
struct InboundConsumer {
    handler: Arc<dyn MessageHandler>,
}

impl InboundConsumer {
    fn new(handler: Arc<dyn MessageHandler>) -> Self {
        Self { handler }
    }

    /// Deserialize and dispatch a single message
    async fn process_message(&self, content: &[u8]) -> Result<()> {
        let message = MessageUtils::deserialize_request(content)?;

        match message {
            AmqpMessage::QueueRequest(request) => {
                info!(
                    "Dispatching queue request - player: '{}', rating: {:.1}",
                    request.player_id, request.rating
                );
                self.handler.handle_queue_request(request).await
            }
            AmqpMessage::LeaveRequest(request) => {
                info!(
                    "Dispatching leave request - player: '{}'",
                    request.player_id
                );
                self.handler.handle_leave_request(request).await
            }
            // deserialize_request already rejects outbound event types
            other => {
                warn!("Ignoring unexpected inbound message: {:?}", other);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl AsyncConsumer for InboundConsumer {
    async fn consume(
        &mut self,
        _channel: &Channel,
        deliver: Deliver,
        _basic_properties: BasicProperties,
        content: Vec<u8>,
    ) {
        let delivery_tag = deliver.delivery_tag();
        let routing_key = deliver.routing_key();

        info!(
            "AMQP message received - delivery_tag: {}, routing_key: '{}', size: {} bytes",
            delivery_tag,
            routing_key,
            content.len()
        );

        let start_time = std::time::Instant::now();

        match self.process_message(&content).await {
            Ok(_) => {
                info!(
                    "Message processed - delivery_tag: {}, processing_time: {:.2}ms",
                    delivery_tag,
                    start_time.elapsed().as_secs_f64() * 1000.0
                );
            }
            Err(e) => {
                error!(
                    "Message processing failed - delivery_tag: {}, error: {}",
                    delivery_tag, e
                );

                let matchmaking_error = match e.downcast::<MatchmakingError>() {
                    Ok(err) => err,
                    Err(err) => MatchmakingError::InternalError {
                        message: err.to_string(),
                    },
                };
                self.handler.handle_error(matchmaking_error, &content).await;
            }
        }
    }
}
