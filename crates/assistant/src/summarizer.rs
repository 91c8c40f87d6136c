//! History summarizer: folds recent turns into a standalone search query.
//!
//! Follow-up questions like "what about cardiac arrest?" retrieve poorly on
//! their own. One completion call rewrites the question with the topics of
//! the recent conversation before it is sent to the search service.

use std::sync::Arc;

use chrono::Utc;
use ragchat_core::Error;
use ragchat_core::event::{DomainEvent, EventBus};
use ragchat_core::message::Message;
use ragchat_core::provider::{CompletionProvider, CompletionRequest};
use tracing::debug;

use crate::text::{escape_dollars, render_history};

/// Build the reformulation prompt.
pub fn summary_prompt(history: &[Message], question: &str) -> String {
    format!(
        "[INST]
Based on the chat history below and the question, generate a query that extend the question
with the chat history provided. The query should be in natural language.
Do not consider the **Sources:** section of responses in the chat history
Do not consider the **Additional Questions:** section of responses in the chat history
Answer with only the query. Do not add any explanation.

<chat_history>
{history}
</chat_history>
<question>
{question}
</question>
[/INST]
",
        history = render_history(history),
    )
}

pub struct HistorySummarizer {
    completion: Arc<dyn CompletionProvider>,
    events: Arc<EventBus>,
}

impl HistorySummarizer {
    pub fn new(completion: Arc<dyn CompletionProvider>, events: Arc<EventBus>) -> Self {
        Self { completion, events }
    }

    /// Rewrite `question` using `history`. Callers only invoke this with a non-empty history.
    pub async fn summarize(
        &self,
        history: &[Message],
        question: &str,
        model: &str,
        debug_enabled: bool,
    ) -> Result<String, Error> {
        let prompt = summary_prompt(history, question);

        debug!(model, history_len = history.len(), "Reformulating question");

        let response = self
            .completion
            .complete(CompletionRequest::new(model, prompt))
            .await?;
        let query = escape_dollars(&response.text);

        if debug_enabled {
            self.events.publish(DomainEvent::QueryReformulated {
                question: question.to_string(),
                query: query.clone(),
                timestamp: Utc::now(),
            });
        }

        Ok(query)
    }
}
