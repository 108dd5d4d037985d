//! Filesystem-backed session repository.
//!
//! One JSON file per conversation under the data directory. Writes go
//! through a temp file plus rename so a crash mid-write never leaves a
//! truncated record; the record layout is the persisted shape of
//! [`SessionState`] (camelCase `systemRole`, role-tagged history,
//! optional usage block).

use std::path::{Path, PathBuf};

use moosebot_core::session::SessionRepository;
use moosebot_types::chat::{ConversationId, SessionState};
use moosebot_types::error::SessionError;

pub struct FsSessionRepository {
    dir: PathBuf,
}

impl FsSessionRepository {
    /// Open the repository, creating the directory when absent.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| SessionError::Storage(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn record_path(&self, id: &ConversationId) -> PathBuf {
        // Conversation ids come from the gateway; keep them from escaping
        // the directory.
        let name: String = id
            .as_str()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl SessionRepository for FsSessionRepository {
    async fn load(&self, id: &ConversationId) -> Result<Option<SessionState>, SessionError> {
        let path = self.record_path(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SessionError::Storage(format!(
                    "read {}: {e}",
                    path.display()
                )));
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| SessionError::Corrupt {
                id: id.to_string(),
                detail: e.to_string(),
            })
    }

    async fn save(&self, id: &ConversationId, state: &SessionState) -> Result<(), SessionError> {
        let path = self.record_path(id);
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| SessionError::Storage(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        write_file(&tmp, json.as_bytes()).await?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| SessionError::Storage(format!("rename {}: {e}", path.display())))
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), SessionError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| SessionError::Storage(format!("write {}: {e}", path.display())))
}
