//! End-to-end chat request handling.
//!
//! A request moves through `received → preprocessed → retrieved →
//! context-assembled → dispatched → streaming`, then `completed` or `failed`
//! once the caller drains the stream. Nothing is retried; the first failure
//! ends the request.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::completion::TokenStream;
use crate::context::{assemble, truncate_to_budget};
use crate::dispatch::CompletionDispatcher;
use crate::error::{RagError, Result};
use crate::logger::{ConversationLogger, LogEntry, spawn_log};
use crate::message::{ChatMessage, Role, SessionId};
use crate::pipeline::RagPipeline;
use crate::query::{PreprocessedQuery, preprocess};

/// Lifecycle stage of one chat request, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Received,
    Preprocessed,
    Retrieved,
    ContextAssembled,
    Dispatched,
    Streaming,
    Completed,
    Failed,
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestStage::Received => "received",
            RequestStage::Preprocessed => "preprocessed",
            RequestStage::Retrieved => "retrieved",
            RequestStage::ContextAssembled => "context-assembled",
            RequestStage::Dispatched => "dispatched",
            RequestStage::Streaming => "streaming",
            RequestStage::Completed => "completed",
            RequestStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Incoming chat request as sent by the site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A started answer: correlation id, retrieval diagnostics and the token stream.
pub struct ChatResponse {
    pub session_id: SessionId,
    pub query: PreprocessedQuery,
    /// Source labels of the passages placed in the context, best first.
    pub sources: Vec<String>,
    pub stream: TokenStream,
}

impl fmt::Debug for ChatResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatResponse")
            .field("session_id", &self.session_id)
            .field("query", &self.query)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

/// Check the message list before any retrieval work.
///
/// # Errors
///
/// Returns [`RagError::InvalidRequest`] if the list is empty, the last
/// message is blank, or the last message was not written by the user.
pub fn validate_messages(messages: &[ChatMessage]) -> Result<&ChatMessage> {
    let last = messages
        .last()
        .ok_or_else(|| RagError::InvalidRequest("messages must not be empty".to_string()))?;
    if last.role != Role::User {
        return Err(RagError::InvalidRequest("last message must come from the user".to_string()));
    }
    if last.content.trim().is_empty() {
        return Err(RagError::InvalidRequest("last message must not be empty".to_string()));
    }
    Ok(last)
}

/// Answers chat requests. Holds no per-request state, so one instance serves
/// any number of concurrent sessions.
pub struct ChatService {
    pipeline: Arc<RagPipeline>,
    dispatcher: CompletionDispatcher,
    logger: Arc<dyn ConversationLogger>,
}

impl ChatService {
    pub fn new(
        pipeline: Arc<RagPipeline>,
        dispatcher: CompletionDispatcher,
        logger: Arc<dyn ConversationLogger>,
    ) -> Self {
        Self { pipeline, dispatcher, logger }
    }

    pub fn pipeline(&self) -> &Arc<RagPipeline> {
        &self.pipeline
    }

    /// Run one request up to the start of streaming.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidRequest`] for a malformed message list
    /// - [`RagError::PipelineError`] if embedding or search fails
    /// - [`RagError::CompletionError`] if the completion service refuses the request
    pub async fn respond(&self, request: ChatRequest) -> Result<ChatResponse> {
        let session_id = SessionId::resolve(request.session_id.as_deref());
        let result = self.run(&session_id, &request.messages).await;
        if let Err(e) = &result {
            warn!(
                session_id = %session_id,
                stage = %RequestStage::Failed,
                error = %e,
                "chat request failed"
            );
        }
        result
    }

    async fn run(&self, session_id: &SessionId, messages: &[ChatMessage]) -> Result<ChatResponse> {
        let question = validate_messages(messages)?;
        debug!(
            session_id = %session_id,
            stage = %RequestStage::Received,
            message_count = messages.len()
        );

        spawn_log(
            Arc::clone(&self.logger),
            session_id.clone(),
            LogEntry::now(Role::User, question.content.clone()),
            None,
        );

        let query = preprocess(&question.content);
        debug!(
            session_id = %session_id,
            stage = %RequestStage::Preprocessed,
            expanded = %query.expanded,
            entities = ?query.entities,
            keywords = ?query.keywords
        );

        let config = self.pipeline.config();
        let results =
            self.pipeline.retrieve(&query.expanded, config.top_k, config.min_score).await?;
        debug!(
            session_id = %session_id,
            stage = %RequestStage::Retrieved,
            result_count = results.len()
        );

        let budgeted = truncate_to_budget(&results, config.max_context_chars);
        let context = assemble(budgeted);
        let sources = budgeted.iter().map(|r| r.chunk.source.clone()).collect();
        debug!(
            session_id = %session_id,
            stage = %RequestStage::ContextAssembled,
            passages = context.passage_count(),
            fallback = context.is_fallback()
        );

        let template = self.dispatcher.config().system_prompt.clone();
        let stream = self.dispatcher.dispatch(session_id, &template, &context, messages).await?;
        debug!(session_id = %session_id, stage = %RequestStage::Dispatched);

        info!(
            session_id = %session_id,
            stage = %RequestStage::Streaming,
            passages = context.passage_count(),
            "answer streaming"
        );
        Ok(ChatResponse { session_id: session_id.clone(), query, sources, stream })
    }
}
