//! The conversation controller runs one question through the RAG pipeline.
//!
//! # Flow
//!
//! 1. **Receive**: validate the turn options, append the user message
//! 2. **Reformulate**: with history enabled and prior turns present, rewrite
//!    the question into a standalone query
//! 3. **Retrieve**: search the selected service for context
//! 4. **Compose**: build the answer prompt
//! 5. **Complete**: ask the model
//! 6. **Commit**: append the assistant message
//!
//! A failure in steps 2 to 5 aborts the turn. The user message stays in the
//! transcript with no answer after it.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use ragchat_config::{AppConfig, PromptProfile, TurnConfig};
use ragchat_core::Error;
use ragchat_core::event::{DomainEvent, EventBus};
use ragchat_core::message::Message;
use ragchat_core::provider::{CompletionProvider, CompletionRequest};
use ragchat_core::search::{SearchProvider, ServiceDescriptor};
use ragchat_providers::Backends;
use tracing::{debug, info, warn};

use crate::prompt::PromptComposer;
use crate::retriever::{ContextRetriever, resolve_service};
use crate::session::Session;
use crate::summarizer::HistorySummarizer;
use crate::text::{escape_dollars, strip_single_quotes};

pub struct ConversationController {
    completion: Arc<dyn CompletionProvider>,
    retriever: ContextRetriever,
    summarizer: HistorySummarizer,
    composer: PromptComposer,
    /// Models a turn may select
    models: Vec<String>,
    events: Arc<EventBus>,
}

impl ConversationController {
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        search: Arc<dyn SearchProvider>,
        profile: PromptProfile,
        models: Vec<String>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            retriever: ContextRetriever::new(search, events.clone()),
            summarizer: HistorySummarizer::new(completion.clone(), events.clone()),
            composer: PromptComposer::new(profile),
            completion,
            models,
            events,
        }
    }

    /// Wire a controller to the configured backends.
    pub fn from_config(backends: &Backends, config: &AppConfig, events: Arc<EventBus>) -> Self {
        Self::new(
            backends.completion.clone(),
            backends.search.clone(),
            config.prompt.clone(),
            config.models.clone(),
            events,
        )
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Answer `question` and record both sides of the turn in `session`.
    ///
    /// Invalid options and unknown services are rejected before anything is
    /// appended to the transcript.
    pub async fn handle_turn(
        &self,
        question: &str,
        config: &TurnConfig,
        session: &mut Session,
    ) -> Result<Message, Error> {
        session.require_input()?;
        config.validate(&self.models)?;
        let service = resolve_service(session.catalog(), &config.service)?.clone();

        session.push(Message::user(question));
        self.events.publish(DomainEvent::TurnStarted {
            question_preview: question.chars().take(80).collect(),
            timestamp: Utc::now(),
        });

        let start = Instant::now();
        info!(
            session = %session.id(),
            service = %service.name,
            model = %config.model,
            "Turn started"
        );

        match self.answer(question, config, &service, session).await {
            Ok(answer) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                info!(
                    answer_len = answer.len(),
                    duration_ms,
                    "Turn completed"
                );
                self.events.publish(DomainEvent::TurnCompleted {
                    model: config.model.clone(),
                    answer_chars: answer.chars().count(),
                    duration_ms,
                    timestamp: Utc::now(),
                });

                let message = Message::assistant(answer);
                session.push(message.clone());
                Ok(message)
            }
            Err(e) => {
                warn!(stage = e.kind(), error = %e, "Turn failed");
                self.events.publish(DomainEvent::TurnFailed {
                    stage: e.kind().to_string(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    /// Steps 2 to 5. Reads the transcript, never writes it.
    async fn answer(
        &self,
        question: &str,
        config: &TurnConfig,
        service: &ServiceDescriptor,
        session: &Session,
    ) -> Result<String, Error> {
        let question = strip_single_quotes(question);

        // ── Reformulate ──
        let history: Vec<Message> = if config.use_chat_history {
            session
                .transcript()
                .history_window(config.num_chat_messages)
                .to_vec()
        } else {
            Vec::new()
        };

        let query = if history.is_empty() {
            question.clone()
        } else {
            self.summarizer
                .summarize(&history, &question, &config.model, config.debug)
                .await?
        };
        debug!(history_len = history.len(), query = %query, "Retrieval query ready");

        // ── Retrieve ──
        let context = self
            .retriever
            .retrieve(&query, service, config.num_retrieved_chunks, config.debug)
            .await?;

        // ── Compose ──
        let prompt = self
            .composer
            .compose(&question, &context.to_prompt_string(), &history);

        // ── Complete ──
        let response = self
            .completion
            .complete(CompletionRequest::new(&config.model, prompt))
            .await?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }

        Ok(escape_dollars(&response.text))
    }
}
