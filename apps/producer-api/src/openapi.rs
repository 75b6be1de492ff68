//! OpenAPI documentation configuration

use crate::api::events;
use domain_notifications::{EventAccepted, EventKind, SubmitEvent};
use utoipa::OpenApi;

/// OpenAPI documentation for the producer API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Notification Producer API",
        version = "1.0.0",
        description = "API for producing notification events",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(events::submit_event, events::list_event_types),
    components(schemas(SubmitEvent, EventAccepted, EventKind, events::EventTypesResponse)),
    tags(
        (name = "events", description = "Event submission endpoints")
    )
)]
pub struct ApiDoc;
