//! # Axum Helpers
//!
//! Shared plumbing for the pipeline's HTTP services:
//!
//! - **[`errors`]**: structured error responses — clients always get JSON,
//!   never a raw stack trace
//! - **[`server`]**: router assembly with OpenAPI docs, health endpoint,
//!   serving with graceful shutdown

pub mod errors;
pub mod server;

pub use errors::{AppError, ErrorResponse};
pub use server::{create_app, create_router, health_router, shutdown_signal, HealthResponse};
