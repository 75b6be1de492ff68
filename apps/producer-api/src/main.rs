use axum::routing::get;
use axum::Json;
use axum_helpers::server::{create_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use messaging::EventPublisher;
use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.environment);

    info!(
        url = %config.broker.url,
        stream = %config.broker.stream,
        "Connecting to event log"
    );

    // Connect with bounded retry; without a connection this process must not
    // start accepting submissions, so exhaustion is fatal.
    let publisher = Arc::new(EventPublisher::new(config.broker.clone()));
    publisher
        .connect()
        .await
        .map_err(|e| eyre::eyre!("Event log connection failed: {}", e))?;

    let state = AppState {
        config: config.clone(),
        publisher: publisher.clone(),
    };

    // Build router with API routes
    let api_routes = api::routes(&state);
    let router = create_router::<openapi::ApiDoc>(api_routes);

    // Merge health endpoint and root banner
    let app = router
        .merge(health_router(state.config.app))
        .route("/", get(root));

    info!("Starting notification producer API");

    create_app(app, &config.server)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    // Flush anything still in flight before exiting.
    publisher.disconnect().await;

    info!("Notification producer API shutdown complete");
    Ok(())
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "Notification Producer API is running"}))
}
