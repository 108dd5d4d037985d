//! Per-conversation sessions and the process-lifetime session store.

pub mod repository;
pub mod session;
pub mod store;

pub use repository::{BoxSessionRepository, SessionRepository};
pub use session::ChatSession;
pub use store::{SessionStore, SessionStoreConfig};
