//! Local corpus search over JSON-lines documents scored in memory.
//!
//! Each service maps to `<corpus_dir>/<service>.jsonl`, one JSON object per
//! line. Records are loaded once at construction; queries use a simple
//! keyword relevance score over the service's search column. Useful for
//! offline sessions and for exercising the assistant without an account.

use async_trait::async_trait;
use ragchat_core::error::RetrievalError;
use ragchat_core::search::{SearchProvider, SearchRecord, ServiceDescriptor};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// An in-memory search backend over per-service record lists.
pub struct CorpusSearchProvider {
    corpora: HashMap<String, Vec<SearchRecord>>,
}

impl CorpusSearchProvider {
    /// Build from records already in memory.
    pub fn from_records(corpora: HashMap<String, Vec<SearchRecord>>) -> Self {
        Self { corpora }
    }

    /// Load `<dir>/<name>.jsonl` for every service name.
    ///
    /// A missing file leaves that service without records; corrupted lines are skipped.
    pub fn load<'a>(dir: &Path, services: impl IntoIterator<Item = &'a str>) -> Self {
        let corpora = services
            .into_iter()
            .map(|name| {
                let path = dir.join(format!("{name}.jsonl"));
                let records = load_jsonl(&path);
                debug!(service = name, path = %path.display(), count = records.len(), "Corpus loaded");
                (name.to_string(), records)
            })
            .collect();
        Self { corpora }
    }

    /// Number of records held for a service.
    pub fn len(&self, service: &str) -> usize {
        self.corpora.get(service).map_or(0, Vec::len)
    }
}

fn load_jsonl(path: &Path) -> Vec<SearchRecord> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corpus file unreadable");
            return Vec::new();
        }
    };

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<SearchRecord>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Skipping corrupted corpus line");
                None
            }
        })
        .collect()
}

/// Text of the search column; non-string values are matched as JSON text.
fn column_text<'a>(record: &'a SearchRecord, column: &str) -> Option<Cow<'a, str>> {
    match record.get(column)? {
        serde_json::Value::String(s) => Some(Cow::Borrowed(s)),
        other => Some(Cow::Owned(other.to_string())),
    }
}

fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

/// Keyword relevance: term hits normalized by document length.
fn score(query_terms: &[String], text: &str) -> f32 {
    let lower = text.to_lowercase();
    let hits: usize = query_terms.iter().map(|t| lower.matches(t.as_str()).count()).sum();
    hits as f32 / (lower.len() as f32 / 100.0).max(1.0)
}

#[async_trait]
impl SearchProvider for CorpusSearchProvider {
    fn name(&self) -> &str {
        "corpus"
    }

    async fn search(
        &self,
        service: &ServiceDescriptor,
        query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<SearchRecord>, RetrievalError> {
        let records = self.corpora.get(&service.name).ok_or_else(|| {
            RetrievalError::Unavailable(format!("no corpus loaded for service '{}'", service.name))
        })?;

        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, &SearchRecord)> = records
            .iter()
            .filter_map(|record| {
                let text = column_text(record, &service.search_column)?;
                let s = score(&query_terms, &text);
                (s > 0.0).then_some((s, record))
            })
            .collect();

        // Stable sort keeps file order among equal scores
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored.into_iter().map(|(_, r)| r.clone()).collect())
    }
}
