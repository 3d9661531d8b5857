//! Trait seams between the API and its backends.

use async_trait::async_trait;

use crate::{Completion, Message, Result};

/// Backend that turns an ordered message sequence into generated text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send `messages` upstream and return the first choice's text.
    ///
    /// Every failure is terminal for the request; implementations do not retry.
    async fn complete(&self, messages: &[Message]) -> Result<Completion>;
}
