//! UI signals: decoupled notifications from the operation router to the UI.
//!
//! The router publishes a signal when a streaming turn starts (the carousel
//! starts spinning) and when the turn's highlighted card is known.
//! Any number of consumers can subscribe without the router knowing them.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::catalog::EntityId;

/// Signals produced by the operation router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiSignal {
    /// A streaming turn began; the agent call is about to be made.
    TurnStarted { thread_id: Option<String> },

    /// The turn's recommended card, or `None` when nothing matched or the
    /// agent call failed.
    EntityHighlighted { entity_id: Option<EntityId> },
}

impl UiSignal {
    /// SSE event name for this signal.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TurnStarted { .. } => "turn_started",
            Self::EntityHighlighted { .. } => "entity_highlighted",
        }
    }
}

/// A broadcast-based bus for UI signals.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct SignalBus {
    sender: broadcast::Sender<Arc<UiSignal>>,
}

impl SignalBus {
    /// Create a new bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a signal to all subscribers.
    pub fn publish(&self, signal: UiSignal) {
        // No subscribers is fine: the UI may not be listening yet
        let _ = self.sender.send(Arc::new(signal));
    }

    pub fn turn_started(&self, thread_id: Option<String>) {
        self.publish(UiSignal::TurnStarted { thread_id });
    }

    pub fn entity_highlighted(&self, entity_id: Option<EntityId>) {
        self.publish(UiSignal::EntityHighlighted { entity_id });
    }

    /// Subscribe to receive signals.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<UiSignal>> {
        self.sender.subscribe()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new(64)
    }
}
