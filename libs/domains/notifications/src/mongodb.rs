//! MongoDB implementation of [`NotificationStore`].

use crate::error::Result;
use crate::models::{Envelope, Notification};
use crate::store::NotificationStore;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use tracing::{error, info, instrument, warn};

/// MongoDB-backed notification store.
#[derive(Clone)]
pub struct MongoNotificationStore {
    collection: Collection<Notification>,
}

impl MongoNotificationStore {
    pub fn new(database: &Database, collection: &str) -> Self {
        Self {
            collection: database.collection(collection),
        }
    }

    /// Create the collection's indexes.
    ///
    /// The unique index on `event_id` is what enforces at-most-one
    /// notification per envelope; `(user_id, timestamp desc)` serves the
    /// pagination query.
    pub async fn create_indexes(&self) -> Result<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "event_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "user_id": 1, "timestamp": -1 })
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        info!("Notification collection indexes created");
        Ok(())
    }
}

/// Whether an insert failed because the unique `event_id` index rejected it.
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}

#[async_trait]
impl NotificationStore for MongoNotificationStore {
    #[instrument(skip(self, envelope), fields(event_id = %envelope.event_id))]
    async fn save(&self, envelope: &Envelope) -> Result<Option<Notification>> {
        let notification = Notification::from_envelope(envelope);

        match self.collection.insert_one(&notification).await {
            Ok(_) => {
                info!(
                    event_id = %notification.event_id,
                    event_type = %notification.event_type,
                    user_id = %notification.user_id,
                    "Notification saved"
                );
                Ok(Some(notification))
            }
            Err(e) if is_duplicate_key(&e) => {
                warn!(
                    event_id = %envelope.event_id,
                    "Notification already exists, skipping"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: &str, limit: i64, skip: u64) -> Vec<Notification> {
        let result = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "timestamp": -1 })
            .skip(skip)
            .limit(limit)
            .await;

        let cursor = match result {
            Ok(cursor) => cursor,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Error querying notifications");
                return Vec::new();
            }
        };

        match cursor.try_collect().await {
            Ok(notifications) => notifications,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Error reading notification cursor");
                Vec::new()
            }
        }
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, event_id: &str, user_id: &str) -> Result<bool> {
        // Matching on both ids keeps one user from flipping another's flag.
        let result = self
            .collection
            .update_one(
                doc! { "event_id": event_id, "user_id": user_id },
                doc! { "$set": { "read": true } },
            )
            .await?;

        if result.modified_count > 0 {
            info!(event_id = %event_id, "Notification marked as read");
            Ok(true)
        } else {
            warn!(event_id = %event_id, user_id = %user_id, "Notification not modified");
            Ok(false)
        }
    }
}
