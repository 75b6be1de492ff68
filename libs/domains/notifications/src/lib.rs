//! Notifications Domain
//!
//! The persisted side of the event pipeline:
//!
//! ```text
//! broker subject ──▶ IngestWorker ──▶ NotificationProcessor ──▶ MongoDB
//!                                                                 │
//!                  GET /notifications/{user_id} ◀─────────────────┤
//!                  PATCH /notifications/{event_id}/read ◀─────────┘
//! ```
//!
//! [`Envelope`] is the canonical event record both services share;
//! [`Notification`] is its stored projection, unique per `event_id` via the
//! store's unique index. [`NotificationProcessor`] plugs the store into the
//! ingestion loop, and [`notifications_router`] exposes the read paths.

use utoipa::OpenApi;

mod error;
mod handlers;
mod models;
mod mongodb;
mod processor;
mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{NotificationError, Result};
pub use handlers::{notifications_router, ListParams, MarkReadParams};
pub use models::{
    Envelope, EventAccepted, EventKind, MarkReadResponse, Notification, NotificationPage,
    SubmitEvent,
};
pub use crate::mongodb::MongoNotificationStore;
pub use processor::NotificationProcessor;
pub use store::NotificationStore;

/// OpenAPI documentation for the notifications API
#[derive(OpenApi)]
#[openapi(
    paths(handlers::list_notifications, handlers::mark_notification_read),
    components(schemas(
        Envelope,
        EventKind,
        Notification,
        NotificationPage,
        MarkReadResponse,
    )),
    tags(
        (name = "notifications", description = "Notification read and read-state endpoints")
    )
)]
pub struct ApiDoc;
