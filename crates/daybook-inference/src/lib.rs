//! # daybook-inference
//!
//! Prompt assembly and the completion API client.
//!
//! - [`PromptAssembler`] builds the report prompt from an optional note and
//!   an optional absolute image URL.
//! - [`openai::OpenAIBackend`] implements [`daybook_core::CompletionBackend`]
//!   against any OpenAI-compatible chat completions endpoint.
//!
//! # Feature Flags
//!
//! - `openai` (default): Enable the OpenAI-compatible backend

pub mod prompt;

#[cfg(feature = "openai")]
pub mod openai;

pub use prompt::{validate_messages, PromptAssembler};

#[cfg(feature = "openai")]
pub use openai::{OpenAIBackend, OpenAIConfig};
