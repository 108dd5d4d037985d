//! Session persistence trait.
//!
//! Whole-record load/save of [`SessionState`], one record per
//! conversation. Implementations live in moosebot-infra. Uses native
//! async fn in traits (RPITIT, Rust 2024 edition) with an object-safe
//! boxed wrapper for storage inside sessions.

use std::future::Future;
use std::pin::Pin;

use moosebot_types::chat::{ConversationId, SessionState};
use moosebot_types::error::SessionError;

/// Durable storage for per-conversation state.
///
/// Load happens once at session creation; save after every mutation.
/// Malformed persisted data must surface as [`SessionError::Corrupt`],
/// never as a silent `None`.
pub trait SessionRepository: Send + Sync {
    fn load(
        &self,
        id: &ConversationId,
    ) -> impl Future<Output = Result<Option<SessionState>, SessionError>> + Send;

    fn save(
        &self,
        id: &ConversationId,
        state: &SessionState,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;
}

trait SessionRepositoryDyn: Send + Sync {
    fn load_boxed<'a>(
        &'a self,
        id: &'a ConversationId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SessionState>, SessionError>> + Send + 'a>>;

    fn save_boxed<'a>(
        &'a self,
        id: &'a ConversationId,
        state: &'a SessionState,
    ) -> Pin<Box<dyn Future<Output = Result<(), SessionError>> + Send + 'a>>;
}

impl<T: SessionRepository> SessionRepositoryDyn for T {
    fn load_boxed<'a>(
        &'a self,
        id: &'a ConversationId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SessionState>, SessionError>> + Send + 'a>> {
        Box::pin(self.load(id))
    }

    fn save_boxed<'a>(
        &'a self,
        id: &'a ConversationId,
        state: &'a SessionState,
    ) -> Pin<Box<dyn Future<Output = Result<(), SessionError>> + Send + 'a>> {
        Box::pin(self.save(id, state))
    }
}

/// Type-erased [`SessionRepository`].
pub struct BoxSessionRepository {
    inner: Box<dyn SessionRepositoryDyn>,
}

impl BoxSessionRepository {
    pub fn new<T: SessionRepository + 'static>(repo: T) -> Self {
        Self {
            inner: Box::new(repo),
        }
    }

    pub async fn load(&self, id: &ConversationId) -> Result<Option<SessionState>, SessionError> {
        self.inner.load_boxed(id).await
    }

    pub async fn save(
        &self,
        id: &ConversationId,
        state: &SessionState,
    ) -> Result<(), SessionError> {
        self.inner.save_boxed(id, state).await
    }
}
