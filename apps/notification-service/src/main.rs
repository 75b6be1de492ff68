use axum::routing::get;
use axum::{Json, Router};
use axum_helpers::errors::not_found;
use axum_helpers::server::{create_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_notifications::{
    ApiDoc, Envelope, MongoNotificationStore, NotificationProcessor,
};
use messaging::{IngestMetrics, IngestWorker, JetStreamSubscription};
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod config;
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

    // Install the Prometheus recorder before anything increments a counter
    let metrics_handle = messaging::metrics::init_metrics()
        .map_err(|e| eyre::eyre!("Failed to install metrics recorder: {}", e))?;

    info!("Connecting to MongoDB at {}", config.mongo.uri());

    // Connect to MongoDB with retry
    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongo, None).await?;

    let db = mongo_client.database(config.mongo.database());

    info!(
        "Successfully connected to MongoDB database: {}",
        config.mongo.database()
    );

    // Initialize the store and its indexes (the unique index on event_id is
    // what makes ingestion idempotent)
    let store = Arc::new(MongoNotificationStore::new(&db, config.mongo.collection()));
    store
        .create_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create notification indexes: {}", e))?;

    // Start the ingestion loop as a background task. The HTTP service comes
    // up regardless; if the loop's connect attempts exhaust it parks in
    // Failed and only the logs say so.
    let processor = NotificationProcessor::with_arc(store.clone());
    let broker = config.broker.clone();
    let ingest = IngestWorker::spawn(
        move || {
            let broker = broker.clone();
            async move { JetStreamSubscription::<Envelope>::open(&broker).await }
        },
        processor,
        config.broker.retry_config(),
        IngestMetrics::new(config.broker.stream.clone(), "notification_processor"),
    );

    info!(
        stream = %config.broker.stream,
        consumer_group = %config.broker.consumer_group,
        "Ingestion loop started"
    );

    let state = AppState {
        config: config.clone(),
        mongo_client: mongo_client.clone(),
        store,
    };

    // Assemble the router: notifications API at the root, docs, health,
    // metrics, structured 404 fallback
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api::routes(&state))
        .merge(health_router(state.config.app))
        .route("/", get(root))
        .route("/metrics", {
            let handle = metrics_handle.clone();
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            })
        })
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    info!("Starting notification service");

    create_app(app, &config.server)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    // Let the in-flight message finish and the subscription unwind before
    // closing the store connection it persists through.
    info!("Shutting down: stopping ingestion loop");
    ingest.stop().await;

    info!("Shutting down: closing MongoDB connections");
    drop(mongo_client);

    info!("Notification service shutdown complete");
    Ok(())
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "Notification Service is running"}))
}
