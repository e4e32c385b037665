//! Completion dispatch: final prompt, streamed answer, post-completion logging.
//!
//! The dispatcher wraps the completion service's token stream. Tokens are
//! forwarded as they arrive; once the upstream stream finishes cleanly the
//! full answer is logged exactly once. A mid-stream error or a dropped
//! stream ends the turn without logging.

use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::chat::RequestStage;
use crate::completion::{CompletionRequest, CompletionService, TokenStream};
use crate::context::AssembledContext;
use crate::error::{RagError, Result};
use crate::lexicon::REDIRECT_PHRASE;
use crate::logger::{ConversationLogger, LogEntry, spawn_log};
use crate::message::{ChatMessage, Role, SessionId};

/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Tuned sampling temperature. Non-zero so answers read as synthesis
/// rather than extraction.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Heading placed between the instruction template and the grounding context.
pub const CONTEXT_HEADING: &str = "## Relevant Context";

/// Default instruction template for the portfolio assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are the assistant on Michael's portfolio website. Answer questions about \
Michael's work, case studies, career, education and design process in the first \
person, as Michael would, using the context below. If the context does not cover \
the question, say so briefly instead of guessing. If the question is unrelated to \
Michael or his work, reply: \"I'm here to help with questions about Michael's work, \
projects and experience. What would you like to know?\"";

/// Fixed parameters of every completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Merge the instruction template with the assembled context.
pub fn build_system_prompt(template: &str, context: &AssembledContext) -> String {
    format!("{template}\n\n{CONTEXT_HEADING}\n\n{}", context.text())
}

/// Whether an answer is the canned off-topic redirect.
pub fn is_redirect(answer: &str) -> bool {
    answer.contains(REDIRECT_PHRASE)
}

/// Sends prompts to the completion service and logs finished answers.
pub struct CompletionDispatcher {
    service: Arc<dyn CompletionService>,
    logger: Arc<dyn ConversationLogger>,
    config: DispatchConfig,
}

impl CompletionDispatcher {
    pub fn new(
        service: Arc<dyn CompletionService>,
        logger: Arc<dyn ConversationLogger>,
        config: DispatchConfig,
    ) -> Self {
        Self { service, logger, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Start a streamed answer for `history` grounded in `context`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CompletionError`] if the service fails before
    /// producing a stream.
    pub async fn dispatch(
        &self,
        session_id: &SessionId,
        template: &str,
        context: &AssembledContext,
        history: &[ChatMessage],
    ) -> Result<TokenStream> {
        let request = CompletionRequest {
            system_prompt: build_system_prompt(template, context),
            messages: history.to_vec(),
            temperature: self.config.temperature,
            model: self.config.model.clone(),
        };
        debug!(
            service = self.service.name(),
            model = %request.model,
            message_count = request.messages.len(),
            prompt_len = request.system_prompt.len(),
            "dispatching completion"
        );

        let service_name = self.service.name().to_string();
        let mut upstream = self.service.stream_complete(request).await.map_err(|e| {
            error!(service = %service_name, error = %e, "completion request failed");
            match e {
                RagError::CompletionError { .. } => e,
                other => RagError::CompletionError {
                    service: service_name.clone(),
                    message: other.to_string(),
                },
            }
        })?;

        let logger = Arc::clone(&self.logger);
        let session_id = session_id.clone();

        let stream = async_stream::stream! {
            let mut answer = String::new();
            while let Some(item) = upstream.next().await {
                match item {
                    Ok(token) => {
                        if token.is_empty() {
                            continue;
                        }
                        answer.push_str(&token);
                        yield Ok(token);
                    }
                    Err(e) => {
                        error!(
                            session_id = %session_id,
                            stage = %RequestStage::Failed,
                            error = %e,
                            "completion stream failed"
                        );
                        yield Err(e);
                        return;
                    }
                }
            }

            let redirect = is_redirect(&answer);
            info!(
                session_id = %session_id,
                stage = %RequestStage::Completed,
                answer_len = answer.len(),
                is_redirect = redirect,
                "completion finished"
            );
            spawn_log(logger, session_id, LogEntry::now(Role::Assistant, answer), Some(redirect));
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::assemble;

    #[test]
    fn system_prompt_labels_context() {
        let prompt = build_system_prompt("Be helpful.", &assemble(&[]));
        assert!(prompt.starts_with("Be helpful.\n\n## Relevant Context\n\n"));
        assert!(prompt.ends_with(crate::context::FALLBACK_CONTEXT));
    }

    #[test]
    fn default_prompt_redirect_is_detectable() {
        assert!(is_redirect(DEFAULT_SYSTEM_PROMPT));
        assert!(!is_redirect("I led the Virgin America redesign."));
    }

    #[test]
    fn default_temperature_is_not_zero() {
        assert!(DispatchConfig::default().temperature > 0.0);
    }
}
