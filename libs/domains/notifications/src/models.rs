//! Notification domain models.

use chrono::{DateTime, Utc};
use messaging::Event;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Enumerated event categories the pipeline accepts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
    ToSchema,
)]
pub enum EventKind {
    #[serde(rename = "notification.created")]
    #[strum(serialize = "notification.created")]
    NotificationCreated,

    #[serde(rename = "notification.sent")]
    #[strum(serialize = "notification.sent")]
    NotificationSent,

    #[serde(rename = "notification.failed")]
    #[strum(serialize = "notification.failed")]
    NotificationFailed,

    #[serde(rename = "user.registered")]
    #[strum(serialize = "user.registered")]
    UserRegistered,

    #[serde(rename = "user.updated")]
    #[strum(serialize = "user.updated")]
    UserUpdated,
}

impl EventKind {
    /// All supported wire names, for the `/events/types` listing.
    pub fn wire_names() -> Vec<String> {
        Self::iter().map(|kind| kind.to_string()).collect()
    }
}

/// The canonical event record exchanged over the broker.
///
/// Serialized as a JSON object with exactly these keys; `timestamp` is an
/// ISO-8601 string. `event_id` is assigned once, at the producer boundary,
/// and never regenerated downstream.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Envelope {
    pub event_id: Uuid,
    pub event_type: EventKind,
    pub user_id: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Stamp a new envelope at the producer boundary.
    pub fn stamp(event_type: EventKind, user_id: String, payload: serde_json::Value) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            user_id,
            payload,
            timestamp: Utc::now(),
        }
    }
}

impl Event for Envelope {
    fn event_id(&self) -> String {
        self.event_id.to_string()
    }

    fn event_kind(&self) -> String {
        self.event_type.to_string()
    }
}

/// Persisted projection of an [`Envelope`].
///
/// At most one document exists per `event_id`, enforced by a unique index on
/// the store. Mutated only by the read-state transition; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub event_id: Uuid,
    pub event_type: EventKind,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Project an envelope into its stored form, stamping persistence time.
    pub fn from_envelope(envelope: &Envelope) -> Self {
        Self {
            event_id: envelope.event_id,
            event_type: envelope.event_type,
            user_id: envelope.user_id.clone(),
            timestamp: envelope.timestamp,
            payload: envelope.payload.clone(),
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Submission body accepted by `POST /api/v1/events`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitEvent {
    pub event_type: EventKind,

    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub user_id: String,

    pub payload: serde_json::Value,
}

/// Response for an accepted event submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventAccepted {
    pub event_id: Uuid,
    pub event_type: EventKind,
    pub timestamp: DateTime<Utc>,
    pub status: &'static str,
}

impl EventAccepted {
    pub fn from_envelope(envelope: &Envelope) -> Self {
        Self {
            event_id: envelope.event_id,
            event_type: envelope.event_type,
            timestamp: envelope.timestamp,
            status: "success",
        }
    }
}

/// One page of a user's notifications, newest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationPage {
    pub user_id: String,
    pub count: usize,
    pub notifications: Vec<Notification>,
}

/// Response for a successful read-state transition.
#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    pub status: &'static str,
    pub event_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_names() {
        let names = EventKind::wire_names();
        assert_eq!(
            names,
            vec![
                "notification.created",
                "notification.sent",
                "notification.failed",
                "user.registered",
                "user.updated",
            ]
        );
    }

    #[test]
    fn test_event_kind_round_trips() {
        for name in EventKind::wire_names() {
            let kind: EventKind = serde_json::from_value(serde_json::json!(name)).unwrap();
            assert_eq!(kind.to_string(), name);
        }
    }

    #[test]
    fn test_unknown_event_kind_rejected() {
        let result = serde_json::from_value::<EventKind>(serde_json::json!("user.deleted"));
        assert!(result.is_err());
    }

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = Envelope::stamp(
            EventKind::UserRegistered,
            "u1".to_string(),
            serde_json::json!({"a": 1}),
        );

        let value = serde_json::to_value(&envelope).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<_> = object.keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["event_id", "event_type", "payload", "timestamp", "user_id"]
        );

        assert_eq!(object["event_type"], "user.registered");
        // ISO-8601 timestamp on the wire.
        let timestamp = object["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_envelope_round_trip_preserves_identity() {
        let envelope = Envelope::stamp(
            EventKind::NotificationSent,
            "u2".to_string(),
            serde_json::json!({"message": "hi"}),
        );

        let bytes = serde_json::to_vec(&envelope).unwrap();
        let decoded: Envelope = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(decoded.event_id, envelope.event_id);
        assert_eq!(decoded.event_type, envelope.event_type);
        assert_eq!(decoded.user_id, envelope.user_id);
        assert_eq!(decoded.payload, envelope.payload);
    }

    #[test]
    fn test_notification_projection_defaults_unread() {
        let envelope = Envelope::stamp(
            EventKind::UserUpdated,
            "u3".to_string(),
            serde_json::json!({}),
        );

        let notification = Notification::from_envelope(&envelope);

        assert_eq!(notification.event_id, envelope.event_id);
        assert_eq!(notification.user_id, "u3");
        assert!(!notification.read);
        assert!(notification.created_at >= envelope.timestamp);
    }

    #[test]
    fn test_submit_event_requires_user_id() {
        let submit = SubmitEvent {
            event_type: EventKind::UserRegistered,
            user_id: String::new(),
            payload: serde_json::json!({}),
        };

        assert!(submit.validate().is_err());
    }

    #[test]
    fn test_event_accepted_echoes_envelope() {
        let envelope = Envelope::stamp(
            EventKind::UserRegistered,
            "u1".to_string(),
            serde_json::json!({"a": 1}),
        );

        let accepted = EventAccepted::from_envelope(&envelope);
        assert_eq!(accepted.event_id, envelope.event_id);
        assert_eq!(accepted.status, "success");
    }
}
