//! Event publisher: one shared outbound connection to the event log.

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::event::Event;
use async_nats::jetstream::{self, stream::Config as StreamConfig, Context};
use async_nats::Client;
use retry::retry_with_backoff;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Broker acknowledgment metadata for a published event.
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    /// Stream that accepted the event (the partition analog).
    pub stream: String,
    /// Sequence assigned by the broker (the offset analog).
    pub sequence: u64,
}

struct Connection {
    client: Client,
    jetstream: Context,
}

/// Shared publisher handle used by all request-handling tasks.
///
/// Holds a single connection behind a `RwLock`; publish calls interleave but
/// each one is awaited to its acknowledgment. [`EventPublisher::connect`] must
/// succeed before the hosting process starts serving requests.
pub struct EventPublisher {
    config: BrokerConfig,
    conn: RwLock<Option<Connection>>,
}

impl EventPublisher {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            conn: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Establish the connection with bounded retry.
    ///
    /// Tries up to the configured number of attempts with a fixed delay
    /// between them, ensuring the target stream exists before reporting
    /// success. On exhaustion returns [`BrokerError::ConnectionExhausted`];
    /// the hosting process must treat that as fatal.
    pub async fn connect(&self) -> Result<(), BrokerError> {
        let attempts = self.config.connect_attempts;

        let connection = retry_with_backoff(|| self.open(), self.config.retry_config())
            .await
            .map_err(|e| BrokerError::ConnectionExhausted {
                attempts,
                last_error: e.to_string(),
            })?;

        info!(
            url = %self.config.url,
            stream = %self.config.stream,
            "Publisher connected to event log"
        );

        *self.conn.write().await = Some(connection);
        Ok(())
    }

    async fn open(&self) -> Result<Connection, BrokerError> {
        let client = async_nats::connect(&self.config.url)
            .await
            .map_err(|e| BrokerError::connect(e.to_string()))?;

        let jetstream = jetstream::new(client.clone());
        ensure_stream(&jetstream, &self.config.stream, &self.config.subject).await?;

        Ok(Connection { client, jetstream })
    }

    /// Publish an event to the configured subject and wait for the broker
    /// acknowledgment.
    ///
    /// Fails with [`BrokerError::NotConnected`] before a successful
    /// [`connect`](Self::connect), and with [`BrokerError::Publish`] if the
    /// broker rejects or times out the send. Publish failures are not retried
    /// here; the HTTP layer surfaces them as request failures.
    pub async fn publish<E: Event>(&self, event: &E) -> Result<PublishReceipt, BrokerError> {
        let jetstream = {
            let guard = self.conn.read().await;
            match guard.as_ref() {
                Some(conn) => conn.jetstream.clone(),
                None => return Err(BrokerError::NotConnected),
            }
        };

        let payload = serde_json::to_vec(event)?;

        let ack = jetstream
            .publish(self.config.subject.clone(), payload.into())
            .await
            .map_err(|e| BrokerError::publish(e.to_string()))?
            .await
            .map_err(|e| BrokerError::publish(e.to_string()))?;

        info!(
            subject = %self.config.subject,
            stream = %ack.stream,
            sequence = ack.sequence,
            event_id = %event.event_id(),
            event_type = %event.event_kind(),
            "Event published"
        );

        Ok(PublishReceipt {
            stream: ack.stream,
            sequence: ack.sequence,
        })
    }

    /// Flush and release the connection. Safe to call when already
    /// disconnected or never connected.
    pub async fn disconnect(&self) {
        let conn = self.conn.write().await.take();

        if let Some(conn) = conn {
            if let Err(e) = conn.client.flush().await {
                warn!(error = %e, "Error flushing publisher connection on disconnect");
            }
            info!("Publisher disconnected from event log");
        }
    }

    /// Whether a connection is currently held.
    pub async fn is_connected(&self) -> bool {
        self.conn.read().await.is_some()
    }
}

/// Create the stream if it does not exist yet.
pub(crate) async fn ensure_stream(
    jetstream: &Context,
    stream: &str,
    subject: &str,
) -> Result<(), BrokerError> {
    if jetstream.get_stream(stream).await.is_ok() {
        return Ok(());
    }

    info!(stream = %stream, subject = %subject, "Creating event log stream");

    jetstream
        .create_stream(StreamConfig {
            name: stream.to_string(),
            subjects: vec![subject.to_string()],
            max_messages: 1_000_000,
            max_age: Duration::from_secs(7 * 24 * 60 * 60),
            ..Default::default()
        })
        .await
        .map_err(|e| BrokerError::connect(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Serialize, Deserialize)]
    struct TestEvent {
        id: String,
    }

    impl Event for TestEvent {
        fn event_id(&self) -> String {
            self.id.clone()
        }

        fn event_kind(&self) -> String {
            "test.event".to_string()
        }
    }

    #[tokio::test]
    async fn test_publish_before_connect_is_not_connected() {
        let publisher = EventPublisher::new(BrokerConfig::default());
        let event = TestEvent {
            id: "ev-1".to_string(),
        };

        let err = publisher.publish(&event).await.unwrap_err();
        assert!(matches!(err, BrokerError::NotConnected));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let publisher = EventPublisher::new(BrokerConfig::default());

        // Never connected: both calls are no-ops.
        publisher.disconnect().await;
        publisher.disconnect().await;
        assert!(!publisher.is_connected().await);
    }

    // Publishing against a live broker is covered by integration tests that
    // require a running NATS server.
    #[tokio::test]
    #[ignore]
    async fn test_connect_and_publish() {
        let publisher = EventPublisher::new(BrokerConfig::default());
        publisher.connect().await.unwrap();

        let receipt = publisher
            .publish(&TestEvent {
                id: "ev-live".to_string(),
            })
            .await
            .unwrap();

        assert!(receipt.sequence > 0);
        publisher.disconnect().await;
    }
}
