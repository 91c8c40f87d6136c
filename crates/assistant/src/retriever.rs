//! Context retrieval: one search call, flattened into prompt text.

use std::sync::Arc;

use chrono::Utc;
use ragchat_core::event::{DomainEvent, EventBus};
use ragchat_core::search::{SearchProvider, ServiceCatalog, ServiceDescriptor};
use ragchat_core::{Error, RetrievalError};
use serde_json::Value;
use tracing::debug;

/// Fragments extracted from one search, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievedContext {
    /// Column the fragments were read from
    pub column: String,
    pub fragments: Vec<String>,
}

impl RetrievedContext {
    /// Fragments joined with a line break; empty when nothing was found.
    pub fn to_prompt_string(&self) -> String {
        self.fragments.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }
}

/// Look up a service by name.
pub fn resolve_service<'a>(
    catalog: &'a ServiceCatalog,
    name: &str,
) -> Result<&'a ServiceDescriptor, Error> {
    if catalog.is_empty() {
        return Err(Error::configuration("no search services are available"));
    }
    catalog.get(name).ok_or_else(|| {
        Error::configuration(format!(
            "unknown search service '{name}' (available: {})",
            catalog.names().collect::<Vec<_>>().join(", ")
        ))
    })
}

pub struct ContextRetriever {
    search: Arc<dyn SearchProvider>,
    events: Arc<EventBus>,
}

impl ContextRetriever {
    pub fn new(search: Arc<dyn SearchProvider>, events: Arc<EventBus>) -> Self {
        Self { search, events }
    }

    /// Resolve `service_name` in `catalog`, then retrieve from it.
    pub async fn retrieve_from(
        &self,
        catalog: &ServiceCatalog,
        service_name: &str,
        query: &str,
        limit: usize,
        debug_enabled: bool,
    ) -> Result<RetrievedContext, Error> {
        let service = resolve_service(catalog, service_name)?;
        self.retrieve(query, service, limit, debug_enabled).await
    }

    /// Query the service and extract its search column from every record.
    ///
    /// The limit is enforced by the provider; nothing is truncated here.
    pub async fn retrieve(
        &self,
        query: &str,
        service: &ServiceDescriptor,
        limit: usize,
        debug_enabled: bool,
    ) -> Result<RetrievedContext, Error> {
        let records = self.search.search(service, query, limit).await?;

        let fragments = records
            .iter()
            .map(|record| match record.get(&service.search_column) {
                Some(Value::String(text)) => Ok(text.clone()),
                Some(other) => Ok(other.to_string()),
                None => Err(RetrievalError::MissingColumn {
                    service: service.name.clone(),
                    column: service.search_column.clone(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let context = RetrievedContext {
            column: service.search_column.clone(),
            fragments,
        };

        debug!(
            backend = self.search.name(),
            service = %service.name,
            fragments = context.len(),
            "Context retrieved"
        );

        if debug_enabled {
            self.events.publish(DomainEvent::ContextRetrieved {
                service: service.name.clone(),
                query: query.to_string(),
                fragments: context.len(),
                context: context.to_prompt_string(),
                timestamp: Utc::now(),
            });
        }

        Ok(context)
    }
}
