//! Event contract the pipeline is generic over.

use serde::{de::DeserializeOwned, Serialize};

/// An event that can travel through the broker.
///
/// The envelope is serialized to JSON for the wire; `event_id` is the stable
/// identity assigned exactly once at the producer boundary, and `event_kind`
/// is the enumerated category name used in logs and metrics.
pub trait Event: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Globally unique identity of this event, assigned at submission.
    fn event_id(&self) -> String;

    /// Wire name of the event's category (e.g. "user.registered").
    fn event_kind(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Serialize, Deserialize)]
    struct TestEvent {
        id: String,
        kind: String,
    }

    impl Event for TestEvent {
        fn event_id(&self) -> String {
            self.id.clone()
        }

        fn event_kind(&self) -> String {
            self.kind.clone()
        }
    }

    #[test]
    fn test_event_accessors() {
        let event = TestEvent {
            id: "ev-1".to_string(),
            kind: "user.registered".to_string(),
        };
        assert_eq!(event.event_id(), "ev-1");
        assert_eq!(event.event_kind(), "user.registered");
    }
}
