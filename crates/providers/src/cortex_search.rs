//! Cortex Search REST client.
//!
//! Queries `POST /api/v2/databases/{db}/schemas/{schema}/cortex-search-services/{name}:query`
//! and returns the `results` array untouched, in service relevance order.

use async_trait::async_trait;
use ragchat_core::error::RetrievalError;
use ragchat_core::search::{SearchProvider, SearchRecord, ServiceDescriptor};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::snowflake::{SnowflakeAccount, http_client};

pub struct CortexSearchProvider {
    account: SnowflakeAccount,
    database: String,
    schema: String,
    client: reqwest::Client,
}

impl CortexSearchProvider {
    pub fn new(
        account: SnowflakeAccount,
        database: impl Into<String>,
        schema: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            account,
            database: database.into(),
            schema: schema.into(),
            client: http_client(timeout_secs),
        }
    }

    fn query_url(&self, service: &str) -> String {
        self.account.url(&format!(
            "/api/v2/databases/{}/schemas/{}/cortex-search-services/{}:query",
            urlencoding::encode(&self.database),
            urlencoding::encode(&self.schema),
            urlencoding::encode(service),
        ))
    }

    fn request_body(service: &ServiceDescriptor, query: &str, limit: usize) -> serde_json::Value {
        serde_json::json!({
            "query": query,
            "columns": [service.search_column],
            "limit": limit,
        })
    }
}

#[async_trait]
impl SearchProvider for CortexSearchProvider {
    fn name(&self) -> &str {
        "cortex"
    }

    async fn search(
        &self,
        service: &ServiceDescriptor,
        query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<SearchRecord>, RetrievalError> {
        let url = self.query_url(&service.name);

        debug!(service = %service.name, limit, "Querying Cortex Search");

        let response = self
            .account
            .authorize(self.client.post(&url))
            .header("Accept", "application/json")
            .json(&Self::request_body(service, query, limit))
            .send()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(RetrievalError::AuthenticationFailed(
                "Snowflake token rejected".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, service = %service.name, body = %error_body, "Cortex Search returned error");
            return Err(RetrievalError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;

        Ok(body.results)
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<SearchRecord>,
}
