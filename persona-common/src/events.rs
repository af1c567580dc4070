//! Analytics event types and EventBus
//!
//! Provides the shared event definitions and a broadcast EventBus for the
//! discovery flow. Events are fire-and-forget: a bus with no subscribers is a
//! normal condition, not an error for the emitting component.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Discovery analytics events
///
/// Events are broadcast via EventBus and can be serialized for downstream
/// analytics sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DiscoveryEvent {
    /// A new discovery session was created
    SessionStarted {
        session_id: Uuid,
        user_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A session action was applied
    ///
    /// `old_step` is the step the time was accounted against, `new_step` the
    /// step after the transition.
    SessionProgressed {
        session_id: Uuid,
        user_id: String,
        /// Action identifier (`select_genre`, `search`, ...)
        action: String,
        old_step: String,
        new_step: String,
        timestamp: DateTime<Utc>,
    },

    /// A session was explicitly abandoned by the user
    SessionAbandoned {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A routed search finished (possibly with zero results)
    SearchCompleted {
        query: String,
        genre: String,
        result_count: usize,
        cached: bool,
        timestamp: DateTime<Utc>,
    },

    /// A candidate was converted into a character draft
    CharacterExtracted {
        session_id: Option<Uuid>,
        source: String,
        confidence: f32,
        structured: bool,
        timestamp: DateTime<Utc>,
    },
}

impl DiscoveryEvent {
    /// Analytics event name
    ///
    /// Progress events are named after the action (`step_search`,
    /// `step_complete`, ...).
    pub fn analytics_name(&self) -> String {
        match self {
            DiscoveryEvent::SessionStarted { .. } => "session_started".to_string(),
            DiscoveryEvent::SessionProgressed { action, .. } => format!("step_{}", action),
            DiscoveryEvent::SessionAbandoned { .. } => "session_abandoned".to_string(),
            DiscoveryEvent::SearchCompleted { .. } => "search_completed".to_string(),
            DiscoveryEvent::CharacterExtracted { .. } => "character_extracted".to_string(),
        }
    }
}

/// Broadcast bus for discovery events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DiscoveryEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow subscribers start
    ///   losing the oldest ones
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: DiscoveryEvent,
    ) -> Result<usize, broadcast::error::SendError<DiscoveryEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: DiscoveryEvent) {
        let name = event.analytics_name();
        if self.tx.send(event).is_err() {
            tracing::trace!(event = %name, "No analytics subscribers for event");
        }
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
