//! In-memory store used by the crate's tests.

use crate::error::{NotificationError, Result};
use crate::models::{Envelope, Notification};
use crate::store::NotificationStore;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A [`NotificationStore`] over a `Vec`, with the same idempotency and
/// read-transition semantics as the MongoDB implementation.
#[derive(Default)]
pub struct MemoryNotificationStore {
    items: Mutex<Vec<Notification>>,
    fail_next: AtomicBool,
}

impl MemoryNotificationStore {
    /// Make the next `save` fail with a database error.
    pub fn fail_next_save(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn save(&self, envelope: &Envelope) -> Result<Option<Notification>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(NotificationError::Database {
                message: "injected store failure".to_string(),
                source: None,
            });
        }

        let mut items = self.items.lock().unwrap();
        if items.iter().any(|n| n.event_id == envelope.event_id) {
            return Ok(None);
        }

        let notification = Notification::from_envelope(envelope);
        items.push(notification.clone());
        Ok(Some(notification))
    }

    async fn list_for_user(&self, user_id: &str, limit: i64, skip: u64) -> Vec<Notification> {
        let items = self.items.lock().unwrap();
        let mut matching: Vec<Notification> = items
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        matching
            .into_iter()
            .skip(skip as usize)
            .take(limit.max(0) as usize)
            .collect()
    }

    async fn mark_read(&self, event_id: &str, user_id: &str) -> Result<bool> {
        let mut items = self.items.lock().unwrap();
        for notification in items.iter_mut() {
            if notification.event_id.to_string() == event_id && notification.user_id == user_id {
                if notification.read {
                    return Ok(false);
                }
                notification.read = true;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;
    use chrono::{Duration, Utc};

    fn envelope_at(user_id: &str, offset_secs: i64) -> Envelope {
        let mut envelope = Envelope::stamp(
            EventKind::NotificationCreated,
            user_id.to_string(),
            serde_json::json!({"n": offset_secs}),
        );
        envelope.timestamp = Utc::now() + Duration::seconds(offset_secs);
        envelope
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let store = MemoryNotificationStore::default();
        let envelope = envelope_at("u1", 0);

        assert!(store.save(&envelope).await.unwrap().is_some());
        assert!(store.save(&envelope).await.unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_and_windows() {
        let store = MemoryNotificationStore::default();
        for offset in 0..5 {
            store.save(&envelope_at("u1", offset)).await.unwrap();
        }
        store.save(&envelope_at("other", 10)).await.unwrap();

        let page = store.list_for_user("u1", 2, 1).await;
        assert_eq!(page.len(), 2);
        // Newest first: offsets 4,3,2,1,0 — skipping one leaves 3,2.
        assert_eq!(page[0].payload["n"], 3);
        assert_eq!(page[1].payload["n"], 2);
    }

    #[tokio::test]
    async fn test_mark_read_true_exactly_once() {
        let store = MemoryNotificationStore::default();
        let envelope = envelope_at("u1", 0);
        store.save(&envelope).await.unwrap();
        let event_id = envelope.event_id.to_string();

        assert!(store.mark_read(&event_id, "u1").await.unwrap());
        assert!(!store.mark_read(&event_id, "u1").await.unwrap());
        assert!(!store.mark_read(&event_id, "u2").await.unwrap());
        assert!(!store.mark_read("missing", "u1").await.unwrap());
    }
}
