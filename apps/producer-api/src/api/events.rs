//! Event submission endpoints.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_helpers::AppError;
use domain_notifications::{Envelope, EventAccepted, EventKind, SubmitEvent};
use serde::Serialize;
use tracing::{error, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// Create the events router.
pub fn router(state: &AppState) -> Router {
    Router::new()
        .route("/events", post(submit_event))
        .route("/events/types", get(list_event_types))
        .with_state(state.clone())
}

/// Accept an event submission and publish it to the event log
#[utoipa::path(
    post,
    path = "/events",
    request_body = SubmitEvent,
    responses(
        (status = 202, description = "Event accepted and durable in the log", body = EventAccepted),
        (status = 400, description = "Validation failure"),
        (status = 500, description = "Event log rejected the publish"),
    ),
    tag = "events"
)]
#[instrument(skip(state, submit), fields(event_type = %submit.event_type, user_id = %submit.user_id))]
pub async fn submit_event(
    State(state): State<AppState>,
    Json(submit): Json<SubmitEvent>,
) -> Result<impl IntoResponse, axum::response::Response> {
    if let Err(validation) = submit.validate() {
        return Err(AppError::bad_request_with_details(
            "Request validation failed",
            serde_json::to_value(validation).unwrap_or_default(),
        ));
    }

    // Identity and timestamp are assigned here, exactly once; downstream
    // components never regenerate them.
    let envelope = Envelope::stamp(submit.event_type, submit.user_id, submit.payload);

    match state.publisher.publish(&envelope).await {
        Ok(_receipt) => Ok((
            StatusCode::ACCEPTED,
            Json(EventAccepted::from_envelope(&envelope)),
        )),
        Err(e) => {
            error!(event_id = %envelope.event_id, error = %e, "Error publishing event");
            Err(
                AppError::InternalServerError(format!("Failed to publish event: {}", e))
                    .into_response(),
            )
        }
    }
}

/// The static list of supported event types.
#[derive(Serialize, ToSchema)]
pub struct EventTypesResponse {
    pub event_types: Vec<String>,
    pub description: &'static str,
}

/// List the supported event types
#[utoipa::path(
    get,
    path = "/events/types",
    responses(
        (status = 200, description = "Supported event types", body = EventTypesResponse),
    ),
    tag = "events"
)]
pub async fn list_event_types() -> Json<EventTypesResponse> {
    Json(EventTypesResponse {
        event_types: EventKind::wire_names(),
        description: "Supported event types for notification system",
    })
}
