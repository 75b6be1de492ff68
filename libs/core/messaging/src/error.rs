//! Error types for the broker layer.

use thiserror::Error;

/// Errors from broker operations.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A single connection attempt failed.
    #[error("Broker connection error: {0}")]
    Connect(String),

    /// All connection attempts were used up.
    #[error("Broker connection attempts exhausted after {attempts} attempts: {last_error}")]
    ConnectionExhausted { attempts: u32, last_error: String },

    /// Publish was called before a connection was established.
    #[error("Publisher is not connected")]
    NotConnected,

    /// The broker rejected or timed out a publish. Not retried internally;
    /// the caller surfaces it as a request failure.
    #[error("Publish error: {0}")]
    Publish(String),

    /// Subscription or acknowledgment error.
    #[error("Consumer error: {0}")]
    Consumer(String),

    /// Payload could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BrokerError {
    pub fn connect(msg: impl Into<String>) -> Self {
        Self::Connect(msg.into())
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    pub fn consumer(msg: impl Into<String>) -> Self {
        Self::Consumer(msg.into())
    }
}

/// Error returned by an [`crate::EventProcessor`].
///
/// A processing error leaves the message uncommitted: the broker will redeliver
/// it, and the idempotent store absorbs the replay once the underlying cause
/// clears.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The store rejected the write with something other than a duplicate key.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Anything else a processor can fail with.
    #[error("Processing error: {0}")]
    Other(String),
}

impl ProcessingError {
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_display_carries_attempts() {
        let err = BrokerError::ConnectionExhausted {
            attempts: 3,
            last_error: "connection refused".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("3 attempts"));
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn test_not_connected_display() {
        assert_eq!(
            BrokerError::NotConnected.to_string(),
            "Publisher is not connected"
        );
    }
}
