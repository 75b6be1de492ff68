//! Shared application state passed to all request handlers.

use messaging::EventPublisher;
use std::sync::Arc;

/// Cloned per handler; the publisher is the single shared broker connection
/// all request tasks publish through.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub publisher: Arc<EventPublisher>,
}
