//! Process-lifetime session store.
//!
//! One [`ChatSession`] per conversation, created lazily on first contact
//! and kept for the life of the process. Concurrent first contacts race
//! benignly: both construct, one wins the map slot, and every caller gets
//! the winner. The excerpt scheduler is spawned only for the winner.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::info;

use moosebot_types::chat::ConversationId;
use moosebot_types::error::SessionError;

use crate::excerpt::ExcerptScheduler;
use crate::provider::BoxChatBackend;
use crate::session::repository::BoxSessionRepository;
use crate::session::session::ChatSession;

/// Store-level knobs, taken from configuration at startup.
#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    /// System role given to conversations with no persisted record.
    pub default_system_role: String,
    /// Prompt-token count above which history is compacted.
    pub excerpt_threshold_tokens: u64,
    /// How often each session's usage is checked.
    pub excerpt_check_interval: Duration,
}

/// Conversation-keyed map of live sessions.
pub struct SessionStore {
    sessions: DashMap<ConversationId, Arc<ChatSession>>,
    repo: Arc<BoxSessionRepository>,
    chat: Arc<BoxChatBackend>,
    config: SessionStoreConfig,
}

impl SessionStore {
    pub fn new(
        repo: Arc<BoxSessionRepository>,
        chat: Arc<BoxChatBackend>,
        config: SessionStoreConfig,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            repo,
            chat,
            config,
        }
    }

    /// The session for `id`, creating it on first contact.
    ///
    /// Repeated calls return the same `Arc`. Corrupt persisted state
    /// fails creation and leaves no entry behind, so the next call
    /// retries the load.
    pub async fn get(&self, id: &ConversationId) -> Result<Arc<ChatSession>, SessionError> {
        if let Some(session) = self.sessions.get(id) {
            return Ok(session.clone());
        }

        let created = Arc::new(
            ChatSession::open(
                id.clone(),
                &self.config.default_system_role,
                self.repo.clone(),
                self.chat.clone(),
            )
            .await?,
        );

        let stored = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| created.clone())
            .clone();

        // Only the session that won the slot gets a scheduler.
        if Arc::ptr_eq(&stored, &created) {
            info!(conversation = %id, "session created");
            let scheduler = ExcerptScheduler::spawn(
                stored.clone(),
                self.config.excerpt_check_interval,
                self.config.excerpt_threshold_tokens,
            );
            stored.attach_scheduler(scheduler);
        }

        Ok(stored)
    }

    /// Stop every session's background timer.
    pub fn shutdown(&self) {
        for entry in self.sessions.iter() {
            entry.value().stop();
        }
        info!(sessions = self.sessions.len(), "session store shut down");
    }
}
