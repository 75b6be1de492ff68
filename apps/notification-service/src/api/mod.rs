//! API routes for the consumer service.
//!
//! The notifications endpoints live at the root (no /api prefix), matching
//! the service's public contract.

pub mod health;

use axum::Router;
use domain_notifications::{notifications_router, MongoNotificationStore};

use crate::state::AppState;

/// Create all API routes.
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .merge(notifications_router::<MongoNotificationStore>().with_state(state.store.clone()))
        .merge(health::router(state.clone()))
}
