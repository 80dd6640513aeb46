//! Quickmatch - Skill-based 1v1 matchmaking microservice
//!
//! This crate provides AMQP-based matchmaking around an in-memory waiting
//! queue: players join with a rating and optional preferences, idle entries
//! expire, and adjacent-skill pairs are matched and announced as events.

pub mod amqp;
pub mod config;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use amqp::publisher::EventPublisher;
pub use queue::{MatchCoordinator, WaitingQueue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
