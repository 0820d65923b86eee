//! Engine event system — decoupled observation of orchestration activity.
//!
//! Events are published when something interesting happens during a turn.
//! UI layers and telemetry can subscribe to react without tight coupling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All engine events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A tool call from a model reply was executed
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// An agent ran through the node framework
    AgentExecuted {
        agent_name: String,
        success: bool,
        timestamp: DateTime<Utc>,
    },

    /// Attachment items were merged into the current turn
    AttachmentsMerged {
        items_added: usize,
        timestamp: DateTime<Utc>,
    },

    /// A turn reached its terminal state
    TurnCompleted {
        context_id: String,
        tool_rounds: u32,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for engine events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<EngineEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: EngineEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<EngineEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(EngineEvent::ToolExecuted {
            tool_name: "search_web".into(),
            success: true,
            duration_ms: 42,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            EngineEvent::ToolExecuted {
                tool_name, success, ..
            } => {
                assert_eq!(tool_name, "search_web");
                assert!(success);
            }
            _ => panic!("Expected ToolExecuted event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(EngineEvent::AttachmentsMerged {
            items_added: 3,
            timestamp: Utc::now(),
        });
    }
}
