//! OpenAI-compatible completion backend.
//!
//! Works with any endpoint that speaks the chat completions API with
//! multimodal `content` arrays (OpenAI, Azure OpenAI, vLLM, LM Studio, ...).
//!
//! # Example
//!
//! ```rust,no_run
//! use daybook_core::CompletionBackend;
//! use daybook_inference::openai::{OpenAIBackend, OpenAIConfig};
//! use daybook_inference::PromptAssembler;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::new(OpenAIConfig {
//!         api_key: Some("sk-...".to_string()),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//!     let messages = PromptAssembler::assemble(Some("walked the dog"), None).unwrap();
//!     let completion = backend.complete(&messages).await.unwrap();
//!     println!("{}", completion.text);
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use error::{transport_error, upstream_error, OpenAIErrorCode};
pub use types::*;
