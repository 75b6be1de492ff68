//! Shared application state.

use database::mongodb::Client;
use domain_notifications::MongoNotificationStore;
use std::sync::Arc;

/// Cloned per handler; the store shares the client's connection pool with
/// the ingestion loop.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub mongo_client: Client,
    pub store: Arc<MongoNotificationStore>,
}
