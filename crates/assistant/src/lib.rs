//! The RagChat conversation pipeline.
//!
//! Each question runs through a fixed sequence:
//!
//! 1. **Receive** the question into the session transcript
//! 2. **Reformulate** follow-ups into a standalone query using recent history
//! 3. **Retrieve** context fragments from the selected search service
//! 4. **Compose** the answer prompt
//! 5. **Complete** with the selected model
//! 6. **Commit** the answer to the transcript
//!
//! Steps never overlap and nothing is retried. The [`Session`] carries the
//! service catalog and transcript between turns.

pub mod controller;
pub mod prompt;
pub mod retriever;
pub mod session;
pub mod summarizer;
pub mod text;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use controller::ConversationController;
pub use prompt::{PromptComposer, REFUSAL};
pub use retriever::{ContextRetriever, RetrievedContext, resolve_service};
pub use session::Session;
pub use summarizer::{HistorySummarizer, summary_prompt};
pub use text::{escape_dollars, render_history, strip_single_quotes};
