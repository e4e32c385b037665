//! Completion service seam.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::ChatMessage;

/// A pull-based stream of answer tokens.
///
/// Dropping the stream cancels the request: no further tokens are pulled
/// from upstream.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Everything the completion service needs for one streamed answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Instruction template merged with the grounding context.
    pub system_prompt: String,
    /// Conversation so far, oldest first, ending with the user's question.
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub model: String,
}

/// An external text-generation service that streams its output.
///
/// # Example
///
/// ```rust,ignore
/// use futures::StreamExt;
///
/// let mut tokens = service.stream_complete(request).await?;
/// while let Some(token) = tokens.next().await {
///     print!("{}", token?);
/// }
/// ```
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Start a streamed completion.
    ///
    /// Errors returned here mean no token was produced; errors yielded by the
    /// stream mean the answer was cut off.
    async fn stream_complete(&self, request: CompletionRequest) -> Result<TokenStream>;
}
