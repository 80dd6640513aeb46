//! Main application state and service coordination
//!
//! This module contains the production AppState that wires configuration,
//! AMQP connections, the match coordinator, the ticker, and the health
//! server together.

use crate::amqp::connection::{AmqpConfig, AmqpConnection};
use crate::amqp::handlers::{MessageHandler, RequestConsumer};
use crate::amqp::publisher::{AmqpEventPublisher, PublisherConfig};
use crate::config::AppConfig;
use crate::error::{MatchmakingError, Result as MatchmakingResult};
use crate::metrics::health::HealthServerConfig;
use crate::metrics::{HealthServer, MetricsCollector, MetricsService};
use crate::queue::coordinator::MatchCoordinator;
use crate::queue::ticker::{QueueTicker, TickerConfig};
use crate::queue::waiting::WaitingQueue;
use crate::types::{LeaveRequest, Player, QueueRequest};
use crate::utils::current_timestamp;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("AMQP connection error: {message}")]
    AmqpConnection { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// Production message handler that feeds the coordinator
struct ProductionMessageHandler {
    coordinator: Arc<MatchCoordinator>,
}

impl ProductionMessageHandler {
    fn new(coordinator: Arc<MatchCoordinator>) -> Self {
        Self { coordinator }
    }
}

#[async_trait]
impl MessageHandler for ProductionMessageHandler {
    async fn handle_queue_request(&self, request: QueueRequest) -> MatchmakingResult<()> {
        let player = Player {
            id: request.player_id.clone(),
            rating: request.rating,
            preferences: request.preferences,
            joined_at: current_timestamp(),
        };

        match self.coordinator.join_queue(player).await {
            Ok(Some(matched)) => {
                info!(
                    "Join request matched immediately - player: '{}', match: {}",
                    request.player_id, matched.id
                );
                Ok(())
            }
            Ok(None) => {
                info!(
                    "Join request queued - player: '{}' waiting for a partner",
                    request.player_id
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    "Join request failed - player: '{}', error: {}",
                    request.player_id, e
                );
                Err(e)
            }
        }
    }

    async fn handle_leave_request(&self, request: LeaveRequest) -> MatchmakingResult<()> {
        self.coordinator.leave_queue(&request.player_id).await?;
        Ok(())
    }

    async fn handle_error(&self, error: MatchmakingError, message_data: &[u8]) {
        error!(
            "Message handler error - type: '{}', message_size: {} bytes",
            error,
            message_data.len()
        );

        // Log a short preview of the message for debugging (safely)
        if !message_data.is_empty() {
            let preview_len = std::cmp::min(100, message_data.len());
            let preview = String::from_utf8_lossy(&message_data[..preview_len]);
            error!("Message preview: {:?}", preview);
        }
    }
}

/// Main application state coordinating all service components
pub struct AppState {
    config: AppConfig,
    coordinator: Arc<MatchCoordinator>,
    metrics_service: MetricsService,
    amqp_connection: AmqpConnection,
    consumer: RequestConsumer,
    ticker: std::sync::Mutex<Option<QueueTicker>>,
    running: Arc<RwLock<bool>>,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Initialize all service components from configuration.
    ///
    /// Connects to the AMQP broker (with retry), builds the queue and
    /// coordinator, and prepares the consumer and health server without
    /// starting them.
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing application state...");

        // Metrics
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|e| {
            warn!("Failed to create metrics collector ({}), using default", e);
            MetricsCollector::default()
        }));

        // AMQP connection and channels
        let mut amqp_config = AmqpConfig::from_url(&config.amqp.url)?;
        amqp_config.max_retries = config.amqp.max_retry_attempts;
        amqp_config.retry_delay_ms = config.amqp.retry_delay_ms;
        amqp_config.connection_timeout_ms = config.amqp.connection_timeout_seconds * 1000;

        let amqp_connection = AmqpConnection::new(amqp_config).await?;
        let publisher_channel = amqp_connection.create_channel().await?;
        let consumer_channel = amqp_connection.create_channel().await?;

        // Event publisher
        let event_publisher = Arc::new(
            AmqpEventPublisher::new(publisher_channel, PublisherConfig::default()).await?,
        );

        // Queue and coordinator
        let queue = WaitingQueue::with_timeout_ms(config.matchmaking.idle_timeout_ms);
        let coordinator = Arc::new(MatchCoordinator::with_metrics(
            queue,
            event_publisher,
            metrics_collector.clone(),
        ));

        // Inbound consumer
        let handler = Arc::new(ProductionMessageHandler::new(coordinator.clone()));
        let consumer = RequestConsumer::new(handler, consumer_channel);

        // Health server
        let health_server = Arc::new(
            HealthServer::new(
                HealthServerConfig {
                    port: config.service.health_port,
                    ..HealthServerConfig::default()
                },
                metrics_collector.clone(),
            )
            .with_coordinator(coordinator.clone()),
        );
        let metrics_service = MetricsService::new(metrics_collector, health_server);

        Ok(Self {
            config,
            coordinator,
            metrics_service,
            amqp_connection,
            consumer,
            ticker: std::sync::Mutex::new(None),
            running: Arc::new(RwLock::new(false)),
            started_at: current_timestamp(),
        })
    }

    /// Start consuming requests, the periodic ticker, and the health server
    pub async fn start(&self) -> Result<()> {
        info!("Starting service components...");

        self.consumer
            .start_consuming(&self.config.amqp.request_queue)
            .await?;

        let ticker = QueueTicker::spawn(
            self.coordinator.clone(),
            TickerConfig {
                tick_interval: self.config.tick_interval(),
            },
        );
        if let Ok(mut slot) = self.ticker.lock() {
            *slot = Some(ticker);
        }

        self.metrics_service.start().await?;

        *self.running.write().await = true;
        info!("All service components started");
        Ok(())
    }

    /// Stop background tasks and close connections
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping service components...");

        *self.running.write().await = false;

        if let Err(e) = self.consumer.stop_consuming().await {
            warn!("Failed to stop consumer cleanly: {}", e);
        }

        let ticker = self.ticker.lock().ok().and_then(|mut slot| slot.take());
        if let Some(ticker) = ticker {
            ticker.shutdown().await;
        }

        self.metrics_service.stop().await?;

        info!("All service components stopped");
        Ok(())
    }

    /// Whether the service is currently running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// The service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The match coordinator
    pub fn coordinator(&self) -> Arc<MatchCoordinator> {
        self.coordinator.clone()
    }

    /// The underlying AMQP connection
    pub fn amqp_connection(&self) -> &AmqpConnection {
        &self.amqp_connection
    }

    /// When the service was initialized
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
