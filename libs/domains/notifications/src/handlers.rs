//! HTTP handlers for the consumer-side notifications API.

use crate::error::NotificationError;
use crate::models::{MarkReadResponse, NotificationPage};
use crate::store::NotificationStore;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use axum_helpers::AppError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Notifications router state
pub type NotificationsState<S> = Arc<S>;

/// Create the notifications router
pub fn notifications_router<S: NotificationStore>() -> Router<NotificationsState<S>> {
    Router::new()
        .route("/notifications/{user_id}", get(list_notifications::<S>))
        .route(
            "/notifications/{event_id}/read",
            patch(mark_notification_read::<S>),
        )
}

fn default_limit() -> i64 {
    10
}

/// Pagination window for the notification listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of notifications to skip (unsigned: negatives are rejected at
    /// deserialization)
    #[serde(default)]
    pub skip: u64,
}

/// List a user's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications/{user_id}",
    params(
        ("user_id" = String, Path, description = "User whose notifications to list"),
        ("limit" = Option<i64>, Query, description = "Page size, 1..=50 (default 10)"),
        ("skip" = Option<u64>, Query, description = "Number of notifications to skip"),
    ),
    responses(
        (status = 200, description = "Page of notifications", body = NotificationPage),
        (status = 400, description = "Pagination bounds violated"),
    ),
    tag = "notifications"
)]
#[instrument(skip(store))]
pub async fn list_notifications<S: NotificationStore>(
    State(store): State<NotificationsState<S>>,
    Path(user_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<NotificationPage>, AppError> {
    if !(1..=50).contains(&params.limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and 50, got {}",
            params.limit
        )));
    }

    let notifications = store
        .list_for_user(&user_id, params.limit, params.skip)
        .await;

    info!(user_id = %user_id, count = notifications.len(), "Notifications fetched");

    Ok(Json(NotificationPage {
        user_id,
        count: notifications.len(),
        notifications,
    }))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadParams {
    /// User making the transition; must own the notification
    pub user_id: String,
}

/// Mark a notification as read
#[utoipa::path(
    patch,
    path = "/notifications/{event_id}/read",
    params(
        ("event_id" = String, Path, description = "Event whose notification to mark"),
        ("user_id" = String, Query, description = "User who owns the notification"),
    ),
    responses(
        (status = 200, description = "Notification transitioned to read", body = MarkReadResponse),
        (status = 404, description = "No unread notification for this event/user pair"),
    ),
    tag = "notifications"
)]
#[instrument(skip(store))]
pub async fn mark_notification_read<S: NotificationStore>(
    State(store): State<NotificationsState<S>>,
    Path(event_id): Path<String>,
    Query(params): Query<MarkReadParams>,
) -> Result<impl IntoResponse, NotificationError> {
    let modified = store.mark_read(&event_id, &params.user_id).await?;

    if !modified {
        return Err(NotificationError::NotFound { event_id });
    }

    info!(event_id = %event_id, "Notification marked as read");

    Ok(Json(MarkReadResponse {
        status: "marked as read",
        event_id,
    }))
}
