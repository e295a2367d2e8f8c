//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for OrderBridge
///
/// Transient classes (`RateLimited`, `Conflict`, `Ambiguous`) are recovered
/// locally by the sync engine through retry and reconciliation; the remaining
/// variants propagate to the caller. The enum is `Clone` so that every waiter
/// joined on a coalesced operation observes the identical failure.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum OrderBridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous response: {0}")]
    Ambiguous(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrderBridgeError {
    /// Whether the error class is expected to clear on its own shortly.
    ///
    /// Used by the entity resolver to decide between falling back to the
    /// slow path and aborting outright.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited(_) | Self::Remote(_))
    }
}

/// Result type alias for OrderBridge operations
pub type Result<T> = std::result::Result<T, OrderBridgeError>;
