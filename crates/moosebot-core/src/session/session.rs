//! A single conversation's state and operations.
//!
//! `ChatSession` owns the system role, the bounded message history and the
//! last-known usage counters, persists the whole record after every
//! mutation, and carries its excerpt-scheduler handle.
//!
//! Every mutating operation runs under one async mutex, held across the
//! provider call. Appends and the destructive excerpt-apply therefore
//! serialize: a compaction can never land in the middle of a turn append.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use moosebot_types::chat::{ConversationId, HistoryEntry, SessionState, UsageSnapshot};
use moosebot_types::error::SessionError;
use moosebot_types::provider::Completion;

use crate::excerpt::ExcerptScheduler;
use crate::provider::BoxChatBackend;
use crate::session::repository::BoxSessionRepository;

/// The instruction sent to the completion backend when compacting history.
const EXCERPT_PROMPT: &str = "Produce a detailed summary of our conversation so far";

/// One conversation's state, operations, and background timer.
pub struct ChatSession {
    id: ConversationId,
    state: Mutex<SessionState>,
    repo: Arc<BoxSessionRepository>,
    chat: Arc<BoxChatBackend>,
    scheduler: std::sync::Mutex<Option<ExcerptScheduler>>,
}

impl ChatSession {
    /// Open a session: seed with the default system role, then replace
    /// the whole state with the persisted record when one exists.
    ///
    /// Malformed persisted data propagates as [`SessionError::Corrupt`]
    /// and aborts construction; a session never silently resets.
    pub async fn open(
        id: ConversationId,
        default_system_role: &str,
        repo: Arc<BoxSessionRepository>,
        chat: Arc<BoxChatBackend>,
    ) -> Result<Self, SessionError> {
        let state = match repo.load(&id).await? {
            Some(persisted) => persisted,
            None => SessionState::new(default_system_role),
        };
        debug!(conversation = %id, history_len = state.history.len(), "session opened");

        Ok(Self {
            id,
            state: Mutex::new(state),
            repo,
            chat,
            scheduler: std::sync::Mutex::new(None),
        })
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub async fn role(&self) -> String {
        self.state.lock().await.system_role.clone()
    }

    pub async fn usage(&self) -> Option<UsageSnapshot> {
        self.state.lock().await.usage
    }

    pub async fn history_len(&self) -> usize {
        self.state.lock().await.history.len()
    }

    /// Replace the system role and persist.
    pub async fn set_role(&self, role: impl Into<String>) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        state.system_role = role.into();
        self.persist(&state).await
    }

    /// Run one conversational turn: complete against system role + history
    /// + the new prompt, then append the user and assistant turns and
    /// persist. On failure nothing is appended.
    pub async fn query(
        &self,
        prompt: &str,
        speaker: Option<String>,
    ) -> Result<String, SessionError> {
        let mut state = self.state.lock().await;
        let user = HistoryEntry::user(prompt, speaker);

        let completion = self
            .chat
            .complete(&state.system_role, &state.history, &user)
            .await?;

        state.history.push(user);
        state.history.push(HistoryEntry::assistant(completion.text.clone()));
        Self::apply_usage(&mut state, &completion);
        self.persist(&state).await?;

        Ok(completion.text)
    }

    /// Vision turn: the image is referenced by URL and never retained;
    /// only the derived answer text is appended to history.
    pub async fn query_with_image(
        &self,
        prompt: &str,
        image_url: &str,
    ) -> Result<String, SessionError> {
        let mut state = self.state.lock().await;

        let completion = self
            .chat
            .complete_with_image(&state.system_role, &state.history, prompt, image_url)
            .await?;

        state.history.push(HistoryEntry::assistant(completion.text.clone()));
        Self::apply_usage(&mut state, &completion);
        self.persist(&state).await?;

        Ok(completion.text)
    }

    /// Append a user turn without calling the provider (replied-to
    /// context, draw captions) and persist.
    pub async fn add_user_context(
        &self,
        content: &str,
        name: Option<String>,
    ) -> Result<(), SessionError> {
        if content.is_empty() {
            return Ok(());
        }
        let mut state = self.state.lock().await;
        state.history.push(HistoryEntry::user(content, name));
        self.persist(&state).await
    }

    /// Summarize the conversation. With `apply`, the whole history is
    /// replaced by a single assistant entry carrying the summary -- the
    /// only non-append mutation of history. Without it, history stays
    /// untouched and the summary is just returned.
    pub async fn excerpt(&self, apply: bool) -> Result<String, SessionError> {
        let mut state = self.state.lock().await;
        let request = HistoryEntry::user(EXCERPT_PROMPT, None);

        let completion = self
            .chat
            .complete(&state.system_role, &state.history, &request)
            .await?;

        if apply {
            state.history = vec![HistoryEntry::assistant(completion.text.clone())];
        }
        Self::apply_usage(&mut state, &completion);
        self.persist(&state).await?;

        Ok(completion.text)
    }

    /// Register the background scheduler owning this session's usage
    /// checks. Called once by the store right after construction.
    pub(crate) fn attach_scheduler(&self, scheduler: ExcerptScheduler) {
        let mut slot = self.scheduler.lock().unwrap_or_else(|p| p.into_inner());
        *slot = Some(scheduler);
    }

    /// Stop this session's background timer. Idempotent.
    pub fn stop(&self) {
        let mut slot = self.scheduler.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(scheduler) = slot.take() {
            scheduler.stop();
        }
    }

    fn apply_usage(state: &mut SessionState, completion: &Completion) {
        if let Some(usage) = completion.usage {
            state.usage = Some(usage);
        }
    }

    async fn persist(&self, state: &SessionState) -> Result<(), SessionError> {
        self.repo.save(&self.id, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryRepo, ScriptedChat};
    use moosebot_types::chat::ChatRole;

    fn conversation() -> ConversationId {
        ConversationId::new("chat1")
    }

    async fn open_session(repo: MemoryRepo, chat: ScriptedChat) -> ChatSession {
        ChatSession::open(
            conversation(),
            "default role",
            Arc::new(BoxSessionRepository::new(repo)),
            Arc::new(BoxChatBackend::new(chat)),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn fresh_session_uses_default_role() {
        let session = open_session(MemoryRepo::new(), ScriptedChat::new()).await;
        assert_eq!(session.role().await, "default role");
        assert_eq!(session.history_len().await, 0);
        assert!(session.usage().await.is_none());
    }

    #[tokio::test]
    async fn persisted_state_replaces_defaults_wholesale() {
        let repo = MemoryRepo::new();
        let mut state = SessionState::new("persisted role");
        state.history.push(HistoryEntry::user("earlier", None));
        state.usage = Some(UsageSnapshot {
            prompt_tokens: 7,
            completion_tokens: 3,
            total_tokens: 10,
        });
        repo.insert(conversation(), state);

        let session = open_session(repo, ScriptedChat::new()).await;
        assert_eq!(session.role().await, "persisted role");
        assert_eq!(session.history_len().await, 1);
        assert_eq!(session.usage().await.unwrap().total_tokens, 10);
    }

    #[tokio::test]
    async fn query_appends_one_user_and_one_assistant_turn() {
        let repo = MemoryRepo::new();
        let chat = ScriptedChat::new();
        chat.push_reply("hello there", Some((12, 4)));
        let session = open_session(repo.clone(), chat).await;

        let answer = session.query("hi", Some("alice".to_string())).await.unwrap();
        assert_eq!(answer, "hello there");
        assert_eq!(session.history_len().await, 2);

        let saved = repo.get(&conversation()).unwrap();
        assert_eq!(saved.history[0].role, ChatRole::User);
        assert_eq!(saved.history[0].name.as_deref(), Some("alice"));
        assert_eq!(saved.history[1].role, ChatRole::Assistant);
        assert_eq!(saved.history[1].content, "hello there");
        assert_eq!(saved.usage.unwrap().prompt_tokens, 12);
    }

    #[tokio::test]
    async fn sequential_turns_grow_history_by_two() {
        let chat = ScriptedChat::new();
        for _ in 0..3 {
            chat.push_reply("ok", None);
        }
        let session = open_session(MemoryRepo::new(), chat).await;

        for i in 0..3 {
            session.query(&format!("turn {i}"), None).await.unwrap();
        }
        assert_eq!(session.history_len().await, 6);
    }

    #[tokio::test]
    async fn failed_query_leaves_state_unchanged() {
        let repo = MemoryRepo::new();
        let chat = ScriptedChat::new();
        chat.fail_next("backend down");
        let session = open_session(repo.clone(), chat).await;

        let err = session.query("hi", None).await.unwrap_err();
        assert!(matches!(err, SessionError::Provider(_)));
        assert_eq!(session.history_len().await, 0);
        assert!(repo.get(&conversation()).is_none());
    }

    #[tokio::test]
    async fn excerpt_apply_collapses_history_to_single_assistant_entry() {
        let repo = MemoryRepo::new();
        let chat = ScriptedChat::new();
        chat.push_reply("one", None);
        chat.push_reply("two", None);
        chat.push_reply("a detailed summary", Some((2500, 40)));
        let session = open_session(repo.clone(), chat).await;

        session.query("first", None).await.unwrap();
        session.query("second", None).await.unwrap();
        assert_eq!(session.history_len().await, 4);

        let summary = session.excerpt(true).await.unwrap();
        assert_eq!(summary, "a detailed summary");
        assert_eq!(session.history_len().await, 1);
        assert_eq!(session.usage().await.unwrap().prompt_tokens, 2500);

        let saved = repo.get(&conversation()).unwrap();
        assert_eq!(saved.history[0].role, ChatRole::Assistant);
        assert_eq!(saved.history[0].content, "a detailed summary");
    }

    #[tokio::test]
    async fn excerpt_without_apply_keeps_history() {
        let chat = ScriptedChat::new();
        chat.push_reply("hi", None);
        chat.push_reply("the summary", None);
        let session = open_session(MemoryRepo::new(), chat).await;

        session.query("hello", None).await.unwrap();
        let summary = session.excerpt(false).await.unwrap();
        assert_eq!(summary, "the summary");
        assert_eq!(session.history_len().await, 2);
    }

    #[tokio::test]
    async fn set_role_persists() {
        let repo = MemoryRepo::new();
        let session = open_session(repo.clone(), ScriptedChat::new()).await;

        session.set_role("you are a pirate").await.unwrap();
        assert_eq!(session.role().await, "you are a pirate");
        assert_eq!(
            repo.get(&conversation()).unwrap().system_role,
            "you are a pirate"
        );
    }

    #[tokio::test]
    async fn add_user_context_skips_empty_content() {
        let session = open_session(MemoryRepo::new(), ScriptedChat::new()).await;
        session.add_user_context("", None).await.unwrap();
        assert_eq!(session.history_len().await, 0);

        session.add_user_context("context", None).await.unwrap();
        assert_eq!(session.history_len().await, 1);
    }

    #[tokio::test]
    async fn corrupt_state_fails_construction() {
        let repo = MemoryRepo::new();
        repo.poison(conversation(), "not valid json");

        let result = ChatSession::open(
            conversation(),
            "default role",
            Arc::new(BoxSessionRepository::new(repo)),
            Arc::new(BoxChatBackend::new(ScriptedChat::new())),
        )
        .await;
        assert!(matches!(result, Err(SessionError::Corrupt { .. })));
    }
}
