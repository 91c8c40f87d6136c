//! Session-scoped conversation state.
//!
//! A session owns the service catalog (discovered once, read-only after
//! that) and the transcript. It is passed to the controller as `&mut`, so
//! one turn finishes before the next can start.

use std::sync::Arc;

use chrono::Utc;
use ragchat_core::event::{DomainEvent, EventBus};
use ragchat_core::message::{Message, Transcript};
use ragchat_core::search::{ServiceCatalog, ServiceDirectory};
use ragchat_core::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub struct Session {
    id: Uuid,
    catalog: ServiceCatalog,
    transcript: Transcript,
    greeting: String,
    events: Arc<EventBus>,
}

impl Session {
    /// Discover services and open a conversation with `greeting`.
    pub async fn start(
        directory: &dyn ServiceDirectory,
        greeting: impl Into<String>,
        events: Arc<EventBus>,
    ) -> Result<Self, Error> {
        let services = directory.list_services().await?;
        let catalog = ServiceCatalog::new(services);

        info!(
            directory = directory.name(),
            services = catalog.len(),
            "Search services discovered"
        );
        if catalog.is_empty() {
            warn!("No search services available, input is disabled");
        }

        events.publish(DomainEvent::ServicesDiscovered {
            count: catalog.len(),
            timestamp: Utc::now(),
        });

        Ok(Self::new(catalog, greeting, events))
    }

    /// Open a conversation over an already known catalog.
    pub fn new(catalog: ServiceCatalog, greeting: impl Into<String>, events: Arc<EventBus>) -> Self {
        let greeting = greeting.into();
        Self {
            id: Uuid::new_v4(),
            catalog,
            transcript: Transcript::with_greeting(greeting.clone()),
            greeting,
            events,
        }
    }

    /// Start a new conversation. The catalog is kept.
    pub fn reset(&mut self) {
        self.transcript = Transcript::with_greeting(self.greeting.clone());
        self.id = Uuid::new_v4();
        self.events.publish(DomainEvent::ConversationReset {
            timestamp: Utc::now(),
        });
        info!(session = %self.id, "Conversation reset");
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Questions are only accepted when at least one service exists.
    pub fn input_enabled(&self) -> bool {
        !self.catalog.is_empty()
    }

    /// Same check as [`Self::input_enabled`], as an error.
    pub fn require_input(&self) -> Result<(), Error> {
        if self.input_enabled() {
            Ok(())
        } else {
            Err(Error::configuration("no search services are available"))
        }
    }

    /// First discovered service, the initial selection.
    pub fn default_service(&self) -> Option<&str> {
        self.catalog.first().map(|s| s.name.as_str())
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.transcript.push(message);
    }
}
