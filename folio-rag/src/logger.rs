//! Conversation log sinks.
//!
//! Logging is fire-and-forget from the chat path: a failing sink is reported
//! with `tracing::warn!` and never reaches the user.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::Result;
use crate::message::{Role, SessionId};

/// One transcript line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Entry stamped with the current time.
    pub fn now(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), timestamp: Utc::now() }
    }
}

/// A sink for conversation transcripts (analytics, CMS, files...).
#[async_trait]
pub trait ConversationLogger: Send + Sync {
    /// Record one message of a session.
    ///
    /// `is_redirect` is set for assistant answers only and tells whether the
    /// answer was the canned off-topic redirect.
    async fn log_message(
        &self,
        session_id: &SessionId,
        entry: &LogEntry,
        is_redirect: Option<bool>,
    ) -> Result<()>;
}

/// Record `entry` on a background task; failures are logged and dropped.
pub fn spawn_log(
    logger: Arc<dyn ConversationLogger>,
    session_id: SessionId,
    entry: LogEntry,
    is_redirect: Option<bool>,
) {
    tokio::spawn(async move {
        if let Err(e) = logger.log_message(&session_id, &entry, is_redirect).await {
            warn!(
                session_id = %session_id,
                role = %entry.role,
                error = %e,
                "conversation logging failed"
            );
        }
    });
}

/// Emits every entry as a structured `tracing` event on the
/// `folio_rag::conversation` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConversationLogger;

#[async_trait]
impl ConversationLogger for TracingConversationLogger {
    async fn log_message(
        &self,
        session_id: &SessionId,
        entry: &LogEntry,
        is_redirect: Option<bool>,
    ) -> Result<()> {
        info!(
            target: "folio_rag::conversation",
            session_id = %session_id,
            role = %entry.role,
            timestamp = %entry.timestamp.to_rfc3339(),
            is_redirect = ?is_redirect,
            content = %entry.content,
            "conversation message"
        );
        Ok(())
    }
}

/// A logged message as kept by [`InMemoryConversationLogger`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedMessage {
    pub session_id: SessionId,
    pub entry: LogEntry,
    pub is_redirect: Option<bool>,
}

/// Keeps every entry in memory. Used by tests and local inspection.
#[derive(Debug, Default)]
pub struct InMemoryConversationLogger {
    messages: RwLock<Vec<LoggedMessage>>,
}

impl InMemoryConversationLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far, in arrival order.
    pub async fn messages(&self) -> Vec<LoggedMessage> {
        self.messages.read().await.clone()
    }

    /// Messages logged for one session.
    pub async fn session(&self, session_id: &SessionId) -> Vec<LoggedMessage> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|m| &m.session_id == session_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ConversationLogger for InMemoryConversationLogger {
    async fn log_message(
        &self,
        session_id: &SessionId,
        entry: &LogEntry,
        is_redirect: Option<bool>,
    ) -> Result<()> {
        self.messages.write().await.push(LoggedMessage {
            session_id: session_id.clone(),
            entry: entry.clone(),
            is_redirect,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::RagError;

    #[derive(Default)]
    struct BrokenLogger {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl ConversationLogger for BrokenLogger {
        async fn log_message(&self, _: &SessionId, _: &LogEntry, _: Option<bool>) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(RagError::LoggerError("sink unreachable".into()))
        }
    }

    #[tokio::test]
    async fn in_memory_logger_filters_by_session() {
        let logger = InMemoryConversationLogger::new();
        let a = SessionId::from("a".to_string());
        let b = SessionId::from("b".to_string());
        logger.log_message(&a, &LogEntry::now(Role::User, "hi"), None).await.unwrap();
        logger.log_message(&b, &LogEntry::now(Role::User, "yo"), None).await.unwrap();

        let only_a = logger.session(&a).await;
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].entry.content, "hi");
    }

    #[tokio::test]
    async fn spawned_failure_is_swallowed() {
        let logger = Arc::new(BrokenLogger::default());
        spawn_log(
            logger.clone(),
            SessionId::generate(),
            LogEntry::now(Role::Assistant, "answer"),
            Some(false),
        );
        for _ in 0..100 {
            if logger.attempts.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(logger.attempts.load(Ordering::SeqCst), 1);

        // The failure stayed inside the spawned task; logging still works afterwards.
        let healthy = Arc::new(InMemoryConversationLogger::new());
        let session = SessionId::from("s".to_string());
        spawn_log(healthy.clone(), session, LogEntry::now(Role::User, "hi"), None);
        for _ in 0..100 {
            if !healthy.messages().await.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(healthy.messages().await.len(), 1);
    }
}
