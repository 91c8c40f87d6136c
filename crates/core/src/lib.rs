//! # RagChat Core
//!
//! Domain types, traits, and error definitions for the RagChat assistant.
//! This crate has **zero framework dependencies**. It defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Both external collaborators (search and completion) are defined as traits
//! here. Implementations live in `ragchat-providers`; orchestration lives in
//! `ragchat-assistant`. Tests swap in scripted implementations.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod search;

// Re-export key types at crate root for ergonomics
pub use error::{CompletionError, DiscoveryError, Error, Result, RetrievalError};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, Role, Transcript};
pub use provider::{CompletionProvider, CompletionRequest, CompletionResponse, Usage};
pub use search::{SearchProvider, SearchRecord, ServiceCatalog, ServiceDescriptor, ServiceDirectory};
