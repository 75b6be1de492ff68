//! Notification domain error types.

use axum_helpers::AppError;
use std::fmt;

/// Result type for notification operations
pub type Result<T> = std::result::Result<T, NotificationError>;

/// Notification domain errors
#[derive(Debug)]
pub enum NotificationError {
    /// Notification not found for the given event/user pair
    NotFound { event_id: String },

    /// MongoDB error
    Database {
        message: String,
        source: Option<mongodb::error::Error>,
    },

    /// Serialization error
    Serialization { message: String },
}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { event_id } => write!(f, "Notification not found: {}", event_id),
            Self::Database { message, .. } => write!(f, "Database error: {}", message),
            Self::Serialization { message } => write!(f, "Serialization error: {}", message),
        }
    }
}

impl std::error::Error for NotificationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database {
                source: Some(e), ..
            } => Some(e),
            _ => None,
        }
    }
}

impl From<mongodb::error::Error> for NotificationError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound { event_id } => {
                AppError::NotFound(format!("Notification not found: {}", event_id))
            }
            NotificationError::Database { message, .. } => AppError::InternalServerError(message),
            NotificationError::Serialization { message } => {
                AppError::InternalServerError(message)
            }
        }
    }
}

impl axum::response::IntoResponse for NotificationError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
