//! Service directories: where a session learns which search services exist.
//!
//! - [`StaticDirectory`] returns the services listed in configuration.
//! - [`SnowflakeSqlDirectory`] asks the account through the SQL statements
//!   API: `SHOW CORTEX SEARCH SERVICES`, then `DESC CORTEX SEARCH SERVICE`
//!   per service to learn its search column.

use async_trait::async_trait;
use ragchat_core::error::DiscoveryError;
use ragchat_core::search::{ServiceDescriptor, ServiceDirectory};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::snowflake::{SnowflakeAccount, http_client, quote_identifier};

/// A fixed list of services.
pub struct StaticDirectory {
    services: Vec<ServiceDescriptor>,
}

impl StaticDirectory {
    pub fn new(services: Vec<ServiceDescriptor>) -> Self {
        Self { services }
    }

    pub fn from_config(config: &ragchat_config::SearchConfig) -> Self {
        Self::new(
            config
                .services
                .iter()
                .map(|s| ServiceDescriptor::new(&s.name, &s.search_column))
                .collect(),
        )
    }
}

#[async_trait]
impl ServiceDirectory for StaticDirectory {
    fn name(&self) -> &str {
        "static"
    }

    async fn list_services(&self) -> std::result::Result<Vec<ServiceDescriptor>, DiscoveryError> {
        Ok(self.services.clone())
    }
}

/// Discovers Cortex Search services in one database and schema.
pub struct SnowflakeSqlDirectory {
    account: SnowflakeAccount,
    database: String,
    schema: String,
    warehouse: Option<String>,
    role: Option<String>,
    client: reqwest::Client,
}

impl SnowflakeSqlDirectory {
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
            warehouse: None,
            role: None,
            client: http_client(timeout_secs),
        }
    }

    pub fn with_session(mut self, warehouse: Option<String>, role: Option<String>) -> Self {
        self.warehouse = warehouse;
        self.role = role;
        self
    }

    fn statement_body(&self, statement: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "statement": statement,
            "timeout": 60,
            "database": self.database,
            "schema": self.schema,
        });
        if let Some(warehouse) = &self.warehouse {
            body["warehouse"] = serde_json::json!(warehouse);
        }
        if let Some(role) = &self.role {
            body["role"] = serde_json::json!(role);
        }
        body
    }

    async fn execute(
        &self,
        statement: &str,
    ) -> std::result::Result<Vec<HashMap<String, String>>, DiscoveryError> {
        debug!(statement, "Executing discovery statement");

        let response = self
            .account
            .authorize(self.client.post(self.account.url("/api/v2/statements")))
            .header("Accept", "application/json")
            .json(&self.statement_body(statement))
            .send()
            .await
            .map_err(|e| DiscoveryError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 202 {
            return Err(DiscoveryError::InvalidResponse(format!(
                "statement still running: {statement}"
            )));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Statement failed");
            return Err(DiscoveryError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let result: StatementResult = response
            .json()
            .await
            .map_err(|e| DiscoveryError::InvalidResponse(e.to_string()))?;

        Ok(result.rows())
    }
}

#[async_trait]
impl ServiceDirectory for SnowflakeSqlDirectory {
    fn name(&self) -> &str {
        "snowflake_sql"
    }

    async fn list_services(&self) -> std::result::Result<Vec<ServiceDescriptor>, DiscoveryError> {
        let services = self.execute("SHOW CORTEX SEARCH SERVICES").await?;

        let mut descriptors = Vec::with_capacity(services.len());
        for row in services {
            let name = row
                .get("name")
                .cloned()
                .ok_or_else(|| DiscoveryError::InvalidResponse("SHOW result has no name column".into()))?;

            let desc = self
                .execute(&format!("DESC CORTEX SEARCH SERVICE {}", quote_identifier(&name)))
                .await?;
            let search_column = desc
                .first()
                .and_then(|r| r.get("search_column"))
                .cloned()
                .ok_or_else(|| {
                    DiscoveryError::InvalidResponse(format!("no search_column for service {name}"))
                })?;

            descriptors.push(ServiceDescriptor::new(name, search_column));
        }

        info!(count = descriptors.len(), "Cortex Search services discovered");
        Ok(descriptors)
    }
}

// --- SQL API types (internal) ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResult {
    result_set_meta_data: ResultSetMetaData,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    row_type: Vec<ColumnType>,
}

#[derive(Debug, Deserialize)]
struct ColumnType {
    name: String,
}

impl StatementResult {
    /// Rows keyed by lowercase column name; NULLs are omitted.
    fn rows(self) -> Vec<HashMap<String, String>> {
        let columns: Vec<String> = self
            .result_set_meta_data
            .row_type
            .into_iter()
            .map(|c| c.name.to_lowercase())
            .collect();

        self.data
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row)
                    .filter_map(|(col, value)| value.map(|v| (col.clone(), v)))
                    .collect()
            })
            .collect()
    }
}
