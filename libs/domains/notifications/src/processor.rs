//! Ingestion processor: envelope in, notification persisted.

use crate::models::Envelope;
use crate::store::NotificationStore;
use async_trait::async_trait;
use messaging::{EventProcessor, ProcessingError};
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info};

/// Persists each delivered envelope through the idempotent store.
///
/// Duplicate deliveries come back as a no-op from the store and are treated
/// as success so the message gets committed; any other store failure is
/// surfaced, leaving the message uncommitted for redelivery.
pub struct NotificationProcessor<S: NotificationStore> {
    store: Arc<S>,
}

impl<S: NotificationStore> NotificationProcessor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn with_arc(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: NotificationStore> EventProcessor<Envelope> for NotificationProcessor<S> {
    async fn process(&self, envelope: &Envelope) -> Result<(), ProcessingError> {
        info!(
            event_id = %envelope.event_id,
            event_type = %envelope.event_type,
            "Received event"
        );

        let saved = self
            .store
            .save(envelope)
            .await
            .map_err(|e| ProcessingError::persistence(e.to_string()))?;

        match saved {
            Some(notification) => {
                debug!(
                    event_id = %notification.event_id,
                    user_id = %notification.user_id,
                    "Notification created"
                );
            }
            None => {
                counter!("notifications_duplicate_total").increment(1);
                debug!(
                    event_id = %envelope.event_id,
                    "Duplicate delivery absorbed"
                );
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "notification_processor"
    }
}

impl<S: NotificationStore> Clone for NotificationProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;
    use crate::testing::MemoryNotificationStore;
    use messaging::Event as _;

    fn envelope(user_id: &str) -> Envelope {
        Envelope::stamp(
            EventKind::UserRegistered,
            user_id.to_string(),
            serde_json::json!({"a": 1}),
        )
    }

    #[tokio::test]
    async fn test_process_persists_notification() {
        let store = MemoryNotificationStore::default();
        let processor = NotificationProcessor::with_arc(Arc::new(store));
        let envelope = envelope("u1");

        processor.process(&envelope).await.unwrap();

        let listed = processor.store.list_for_user("u1", 10, 0).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].event_id.to_string(), envelope.event_id());
        assert!(!listed[0].read);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_success() {
        let store = MemoryNotificationStore::default();
        let processor = NotificationProcessor::with_arc(Arc::new(store));
        let envelope = envelope("u1");

        processor.process(&envelope).await.unwrap();
        // Redelivery: still Ok, still exactly one stored notification.
        processor.process(&envelope).await.unwrap();

        let listed = processor.store.list_for_user("u1", 10, 0).await;
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_processing_error() {
        let store = MemoryNotificationStore::default();
        store.fail_next_save();
        let processor = NotificationProcessor::with_arc(Arc::new(store));

        let err = processor.process(&envelope("u1")).await.unwrap_err();
        assert!(matches!(err, ProcessingError::Persistence(_)));
    }
}
