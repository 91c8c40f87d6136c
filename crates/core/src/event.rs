//! Domain event system: the debug and lifecycle channel of a conversation.
//!
//! The assistant publishes events as a turn progresses. A presentation layer
//! subscribes to show debug output (retrieved context, reformulated query)
//! without the core knowing how it is rendered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// Search services were discovered for a new session
    ServicesDiscovered {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A turn began processing a question
    TurnStarted {
        question_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// Debug: the question was rewritten using chat history
    QueryReformulated {
        question: String,
        query: String,
        timestamp: DateTime<Utc>,
    },

    /// Debug: context assembled from the search service
    ContextRetrieved {
        service: String,
        query: String,
        fragments: usize,
        context: String,
        timestamp: DateTime<Utc>,
    },

    /// The assistant answered
    TurnCompleted {
        model: String,
        answer_chars: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A turn aborted without an answer
    TurnFailed {
        stage: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// The conversation was reset to the greeting
    ConversationReset { timestamp: DateTime<Utc> },
}

impl DomainEvent {
    /// Whether this event carries debug-only payload.
    pub fn is_debug(&self) -> bool {
        matches!(
            self,
            DomainEvent::QueryReformulated { .. } | DomainEvent::ContextRetrieved { .. }
        )
    }
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
