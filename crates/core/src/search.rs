//! Search traits and service metadata.
//!
//! A search service is a named index over document fragments. Each service
//! designates one column as its search column: the text that gets fed to the
//! model as context. The set of known services is discovered once per session
//! and held in a read-only [`ServiceCatalog`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, RetrievalError};

/// One search result, addressable by column name.
pub type SearchRecord = serde_json::Map<String, serde_json::Value>;

/// Describes one available search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Service name, as passed to the search provider
    pub name: String,

    /// Column holding the fragment text
    pub search_column: String,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>, search_column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            search_column: search_column.into(),
        }
    }
}

/// Read-only mapping of service name → descriptor, in discovery order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceCatalog {
    services: Vec<ServiceDescriptor>,
}

impl ServiceCatalog {
    /// Build a catalog. Later duplicates of a name are ignored.
    pub fn new(services: impl IntoIterator<Item = ServiceDescriptor>) -> Self {
        let mut unique: Vec<ServiceDescriptor> = Vec::new();
        for service in services {
            if unique.iter().all(|s| s.name != service.name) {
                unique.push(service);
            }
        }
        Self { services: unique }
    }

    pub fn get(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter()
    }

    pub fn first(&self) -> Option<&ServiceDescriptor> {
        self.services.first()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// A search backend that can query any of its named services.
///
/// Results come back in the provider's relevance order and never exceed
/// `limit`; callers do not re-rank or truncate.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// A human-readable name for this backend (e.g., "cortex", "corpus").
    fn name(&self) -> &str;

    /// Query one service.
    async fn search(
        &self,
        service: &ServiceDescriptor,
        query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<SearchRecord>, RetrievalError>;
}

/// Lists the search services available to a session.
#[async_trait]
pub trait ServiceDirectory: Send + Sync {
    fn name(&self) -> &str;

    async fn list_services(&self) -> std::result::Result<Vec<ServiceDescriptor>, DiscoveryError>;
}
