//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`EngineEvent`]s. It is
//! designed to be shared via `Arc<EventBus>`; the dispatcher subscribes and
//! renders whatever it cares about. Publishing never fails the publishing
//! operation: an event with no listeners is simply dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use deadline_core::types::DbId;

/// Default capacity of the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// EngineEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred in the engine.
///
/// Constructed via [`EngineEvent::new`] and enriched with
/// [`with_character`](EngineEvent::with_character) and
/// [`with_payload`](EngineEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Dot-separated event name, e.g. `"needs.critical"`.
    pub event_type: String,

    /// The character the event concerns, when there is one.
    pub character_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl EngineEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            character_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the concerned character.
    pub fn with_character(mut self, character_id: DbId) -> Self {
        self.character_id = Some(character_id);
        self
    }

    /// Set the JSON payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Shared broadcast hub for engine events.
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Create a bus with the default channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus with an explicit channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, returning how many subscribers received it.
    ///
    /// A bus with no subscribers swallows the event; that is not an error.
    pub fn publish(&self, event: EngineEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(err) => {
                tracing::debug!(event_type = %err.0.event_type, "Event dropped: no subscribers");
                0
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let delivered = bus.publish(
            EngineEvent::new("needs.critical")
                .with_character(7)
                .with_payload(serde_json::json!({ "need": "thirst", "level": 92 })),
        );
        assert_eq!(delivered, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, "needs.critical");
        assert_eq!(event.character_id, Some(7));
        assert_eq!(event.payload["level"], 92);
    }

    #[test]
    fn test_publish_without_subscribers_is_swallowed() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(EngineEvent::new("character.trauma")), 0);
    }
}
