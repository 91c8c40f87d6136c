//! Backend router: builds the completion, search and directory backends
//! named in configuration.

use std::path::PathBuf;
use std::sync::Arc;

use ragchat_config::AppConfig;
use ragchat_core::Error;
use ragchat_core::provider::CompletionProvider;
use ragchat_core::search::{SearchProvider, ServiceDirectory};
use tracing::debug;

use crate::corpus::CorpusSearchProvider;
use crate::cortex_complete::CortexCompleteProvider;
use crate::cortex_search::CortexSearchProvider;
use crate::directory::{SnowflakeSqlDirectory, StaticDirectory};
use crate::openai_compat::OpenAiCompatProvider;
use crate::snowflake::SnowflakeAccount;

/// The three external collaborators a session needs.
#[derive(Clone)]
pub struct Backends {
    pub completion: Arc<dyn CompletionProvider>,
    pub search: Arc<dyn SearchProvider>,
    pub directory: Arc<dyn ServiceDirectory>,
}

/// Build backends from configuration.
pub fn build_from_config(config: &AppConfig) -> Result<Backends, Error> {
    let completion = build_completion(config)?;
    let search = build_search(config)?;
    let directory = build_directory(config)?;

    debug!(
        completion = completion.name(),
        search = search.name(),
        directory = directory.name(),
        "Backends built"
    );

    Ok(Backends {
        completion,
        search,
        directory,
    })
}

fn require_account(config: &AppConfig, purpose: &str) -> Result<SnowflakeAccount, Error> {
    SnowflakeAccount::from_config(&config.snowflake).ok_or_else(|| {
        Error::configuration(format!(
            "{purpose} needs snowflake.account_url and snowflake.token (or SNOWFLAKE_ACCOUNT_URL / SNOWFLAKE_TOKEN)"
        ))
    })
}

fn require_location(config: &AppConfig) -> Result<(String, String), Error> {
    match (&config.search.database, &config.search.schema) {
        (Some(db), Some(schema)) => Ok((db.clone(), schema.clone())),
        _ => Err(Error::configuration(
            "search.database and search.schema are required for the cortex backend",
        )),
    }
}

fn build_completion(config: &AppConfig) -> Result<Arc<dyn CompletionProvider>, Error> {
    let timeout = config.completion.timeout_secs;

    if config.completion.provider == "cortex" {
        let account = require_account(config, "Cortex completion")?;
        return Ok(Arc::new(CortexCompleteProvider::new(account, timeout)));
    }

    let name = &config.completion.provider;
    let base_url = config
        .completion
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(name));
    let api_key = config.completion.api_key.clone().unwrap_or_default();

    Ok(Arc::new(OpenAiCompatProvider::new(
        name, base_url, api_key, timeout,
    )))
}

fn build_search(config: &AppConfig) -> Result<Arc<dyn SearchProvider>, Error> {
    match config.search.backend.as_str() {
        "cortex" => {
            let account = require_account(config, "Cortex Search")?;
            let (database, schema) = require_location(config)?;
            Ok(Arc::new(CortexSearchProvider::new(
                account,
                database,
                schema,
                config.search.timeout_secs,
            )))
        }
        "corpus" => {
            let dir = config
                .search
                .corpus_dir
                .as_ref()
                .map(PathBuf::from)
                .ok_or_else(|| Error::configuration("search.corpus_dir is required for the corpus backend"))?;
            Ok(Arc::new(CorpusSearchProvider::load(
                &dir,
                config.search.services.iter().map(|s| s.name.as_str()),
            )))
        }
        other => Err(Error::configuration(format!(
            "unknown search backend '{other}'"
        ))),
    }
}

fn build_directory(config: &AppConfig) -> Result<Arc<dyn ServiceDirectory>, Error> {
    if !config.search.discover {
        return Ok(Arc::new(StaticDirectory::from_config(&config.search)));
    }

    if config.search.backend != "cortex" {
        return Err(Error::configuration(
            "search.discover is only supported with the cortex backend",
        ));
    }

    let account = require_account(config, "Service discovery")?;
    let (database, schema) = require_location(config)?;
    Ok(Arc::new(
        SnowflakeSqlDirectory::new(account, database, schema, config.search.timeout_secs)
            .with_session(
                config.snowflake.warehouse.clone(),
                config.snowflake.role.clone(),
            ),
    ))
}

/// Get the default base URL for well-known OpenAI-compatible providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "fireworks" => "https://api.fireworks.ai/inference/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
