//! Best-effort character notification port.
//!
//! The engine warns a character the first time a survival need crosses the
//! critical threshold. Delivery is a side channel owned by the dispatcher
//! (a chat message, typically); the engine only talks to the
//! [`NotificationSink`] trait and treats every failure as non-fatal.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use deadline_core::needs::NeedKind;
use deadline_core::types::DbId;

use crate::bus::{EngineEvent, EventBus};

/// A needs-critical warning addressed to one character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedsAlert {
    pub character_id: DbId,
    pub need: NeedKind,
    pub level: i32,
}

/// Error surfaced by a sink that failed to deliver.
#[derive(Debug, thiserror::Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Outbound delivery port implemented by the dispatcher.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, alert: &NeedsAlert) -> Result<(), NotifyError>;
}

/// Default sink: republish alerts onto the [`EventBus`].
pub struct BusSink {
    bus: Arc<EventBus>,
}

impl BusSink {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl NotificationSink for BusSink {
    async fn deliver(&self, alert: &NeedsAlert) -> Result<(), NotifyError> {
        self.bus.publish(
            EngineEvent::new("needs.critical")
                .with_character(alert.character_id)
                .with_payload(serde_json::json!({
                    "need": alert.need.as_str(),
                    "level": alert.level,
                })),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bus_sink_republishes() {
        let bus = Arc::new(EventBus::new());
        let mut rx = bus.subscribe();
        let sink = BusSink::new(bus.clone());

        sink.deliver(&NeedsAlert {
            character_id: 3,
            need: NeedKind::Hunger,
            level: 95,
        })
        .await
        .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, "needs.critical");
        assert_eq!(event.payload["need"], "hunger");
    }
}
