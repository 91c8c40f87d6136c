//! Shared test doubles for the assistant pipeline.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use ragchat_core::error::{CompletionError, DiscoveryError, RetrievalError};
use ragchat_core::provider::{CompletionProvider, CompletionRequest, CompletionResponse};
use ragchat_core::search::{SearchProvider, SearchRecord, ServiceDescriptor, ServiceDirectory};
use serde_json::Value;

/// Returns scripted results in order and records every request.
///
/// Panics when called more times than it was scripted for, so a test
/// that expects N model calls fails loudly on call N+1.
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<Result<String, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    /// Fails on the first call.
    pub fn failing() -> Self {
        Self::new(vec![Err(CompletionError::ApiError {
            status_code: 500,
            message: "model unavailable".into(),
        })])
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedCompletion: no more scripted responses");
        next.map(|text| CompletionResponse {
            text,
            model,
            usage: None,
        })
    }
}

/// Returns canned records, truncated to the requested limit.
pub struct StaticSearch {
    records: Vec<SearchRecord>,
    calls: Mutex<Vec<(String, String, usize)>>,
}

impl StaticSearch {
    pub fn new(records: Vec<SearchRecord>) -> Self {
        Self {
            records,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Records with a single `chunk` column.
    pub fn with_chunks(chunks: &[&str]) -> Self {
        Self::new(
            chunks
                .iter()
                .map(|c| {
                    let mut record = SearchRecord::new();
                    record.insert("chunk".into(), Value::String(c.to_string()));
                    record
                })
                .collect(),
        )
    }

    /// `(service, query, limit)` for every search call.
    pub fn calls(&self) -> Vec<(String, String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(
        &self,
        service: &ServiceDescriptor,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchRecord>, RetrievalError> {
        self.calls
            .lock()
            .unwrap()
            .push((service.name.clone(), query.to_string(), limit));
        Ok(self.records.iter().take(limit).cloned().collect())
    }
}

pub struct FailingSearch;

#[async_trait]
impl SearchProvider for FailingSearch {
    fn name(&self) -> &str {
        "failing"
    }

    async fn search(
        &self,
        _service: &ServiceDescriptor,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<SearchRecord>, RetrievalError> {
        Err(RetrievalError::Unavailable("search service is down".into()))
    }
}

/// Directory returning a fixed list, or an error when built with `failing()`.
pub struct FixedDirectory {
    services: Option<Vec<ServiceDescriptor>>,
}

impl FixedDirectory {
    pub fn new(services: Vec<ServiceDescriptor>) -> Self {
        Self {
            services: Some(services),
        }
    }

    pub fn failing() -> Self {
        Self { services: None }
    }
}

#[async_trait]
impl ServiceDirectory for FixedDirectory {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn list_services(&self) -> Result<Vec<ServiceDescriptor>, DiscoveryError> {
        self.services
            .clone()
            .ok_or_else(|| DiscoveryError::Network("directory unreachable".into()))
    }
}
