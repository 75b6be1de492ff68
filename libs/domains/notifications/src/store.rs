//! Persistence contract for notifications.

use crate::error::Result;
use crate::models::{Envelope, Notification};
use async_trait::async_trait;

/// Idempotent notification persistence plus the two read paths.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Persist the envelope's projection.
    ///
    /// Returns the created notification, or `None` when a notification with
    /// the same `event_id` already exists — the idempotency seam that makes
    /// broker redelivery safe. Any other persistence error propagates.
    async fn save(&self, envelope: &Envelope) -> Result<Option<Notification>>;

    /// The user's notifications ordered by event timestamp descending,
    /// windowed by skip/limit. Returns an empty list on an underlying store
    /// error (logged); bounds are enforced at the API boundary.
    async fn list_for_user(&self, user_id: &str, limit: i64, skip: u64) -> Vec<Notification>;

    /// Set `read = true` on the document matching both `event_id` and
    /// `user_id`. Returns true iff a document was actually modified; an
    /// already-read or non-existent notification yields false.
    async fn mark_read(&self, event_id: &str, user_id: &str) -> Result<bool>;
}
