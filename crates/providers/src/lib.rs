//! Backend implementations for RagChat.
//!
//! Completion providers implement `ragchat_core::CompletionProvider`, search
//! backends implement `ragchat_core::SearchProvider`, and directories
//! implement `ragchat_core::ServiceDirectory`. The router picks them from
//! configuration.

pub mod corpus;
pub mod cortex_complete;
pub mod cortex_search;
pub mod directory;
pub mod openai_compat;
pub mod router;
pub mod snowflake;

pub use corpus::CorpusSearchProvider;
pub use cortex_complete::CortexCompleteProvider;
pub use cortex_search::CortexSearchProvider;
pub use directory::{SnowflakeSqlDirectory, StaticDirectory};
pub use openai_compat::OpenAiCompatProvider;
pub use router::{Backends, build_from_config};
pub use snowflake::SnowflakeAccount;
