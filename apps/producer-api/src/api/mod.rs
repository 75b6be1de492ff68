//! API routes for the producer service.

pub mod events;

use axum::Router;

use crate::state::AppState;

/// Create all API routes.
/// Note: these are nested under /api by axum_helpers::create_router.
pub fn routes(state: &AppState) -> Router {
    Router::new().nest("/v1", events::router(state))
}
