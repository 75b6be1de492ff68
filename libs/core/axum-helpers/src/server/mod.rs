mod app;
mod health;

pub use app::{create_app, create_router, shutdown_signal};
pub use health::{health_router, HealthResponse};
