//! In-memory fakes for the capability traits, shared by the crate's tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use moosebot_types::chat::{
    AspectRatio, ConversationId, HistoryEntry, SessionState, UsageSnapshot,
};
use moosebot_types::error::{GatewayError, ProviderError, SessionError};
use moosebot_types::gateway::{InboundMessage, MediaPayload, MessageRef, PhotoRef, VoiceRef};
use moosebot_types::provider::{Completion, ImageJobHandle, ImagePoll, ModerationVerdict};

use crate::provider::backend::{
    ChatBackend, ImageBackend, MessagingGateway, ModerationBackend, SpeechBackend,
};
use crate::provider::{
    BoxChatBackend, BoxGateway, BoxImageBackend, BoxModerationBackend, BoxSpeechBackend,
};
use crate::router::CommandContext;
use crate::session::repository::{BoxSessionRepository, SessionRepository};
use crate::session::ChatSession;

// ---------------------------------------------------------------------------
// Session repository
// ---------------------------------------------------------------------------

/// Repository keeping serialized records in memory. Records round-trip
/// through JSON so corrupt-data paths are exercised for real.
#[derive(Clone, Default)]
pub(crate) struct MemoryRepo {
    records: Arc<Mutex<HashMap<ConversationId, String>>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: ConversationId, state: SessionState) {
        let json = serde_json::to_string(&state).unwrap();
        self.records.lock().unwrap().insert(id, json);
    }

    /// Store garbage that will fail schema validation on load.
    pub fn poison(&self, id: ConversationId, garbage: &str) {
        self.records.lock().unwrap().insert(id, garbage.to_string());
    }

    pub fn get(&self, id: &ConversationId) -> Option<SessionState> {
        let records = self.records.lock().unwrap();
        let json = records.get(id)?;
        Some(serde_json::from_str(json).unwrap())
    }
}

impl SessionRepository for MemoryRepo {
    async fn load(&self, id: &ConversationId) -> Result<Option<SessionState>, SessionError> {
        let json = match self.records.lock().unwrap().get(id) {
            Some(json) => json.clone(),
            None => return Ok(None),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| SessionError::Corrupt {
                id: id.to_string(),
                detail: e.to_string(),
            })
    }

    async fn save(&self, id: &ConversationId, state: &SessionState) -> Result<(), SessionError> {
        let json = serde_json::to_string(state)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        self.records.lock().unwrap().insert(id.clone(), json);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Chat backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ScriptedChatInner {
    replies: VecDeque<Result<Completion, String>>,
    prompts_seen: Vec<String>,
}

/// Chat backend answering from a pre-loaded script; an empty script
/// answers "ok".
#[derive(Clone, Default)]
pub(crate) struct ScriptedChat {
    inner: Arc<Mutex<ScriptedChatInner>>,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, text: &str, usage: Option<(u64, u64)>) {
        let usage = usage.map(|(prompt, completion)| UsageSnapshot {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        });
        self.inner.lock().unwrap().replies.push_back(Ok(Completion {
            text: text.to_string(),
            usage,
        }));
    }

    pub fn fail_next(&self, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .replies
            .push_back(Err(message.to_string()));
    }

    pub fn prompts_seen(&self) -> Vec<String> {
        self.inner.lock().unwrap().prompts_seen.clone()
    }

    fn next(&self, prompt: &str) -> Result<Completion, ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner.prompts_seen.push(prompt.to_string());
        match inner.replies.pop_front() {
            Some(Ok(completion)) => Ok(completion),
            Some(Err(message)) => Err(ProviderError::Api { message }),
            None => Ok(Completion {
                text: "ok".to_string(),
                usage: None,
            }),
        }
    }
}

impl ChatBackend for ScriptedChat {
    async fn complete(
        &self,
        _system_role: &str,
        _history: &[HistoryEntry],
        prompt: &HistoryEntry,
    ) -> Result<Completion, ProviderError> {
        self.next(&prompt.content)
    }

    async fn complete_with_image(
        &self,
        _system_role: &str,
        _history: &[HistoryEntry],
        prompt: &str,
        _image_url: &str,
    ) -> Result<Completion, ProviderError> {
        self.next(prompt)
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GatewayCall {
    Typing,
    Text(String),
    Photo { caption: Option<String> },
    Voice,
    Edit { message_id: i64, text: String },
    Delete { message_id: i64 },
}

#[derive(Default)]
struct RecordingGatewayInner {
    calls: Vec<GatewayCall>,
}

/// Gateway recording every outbound call.
#[derive(Clone, Default)]
pub(crate) struct RecordingGateway {
    inner: Arc<Mutex<RecordingGatewayInner>>,
    next_message_id: Arc<AtomicI64>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GatewayCall) {
        self.inner.lock().unwrap().calls.push(call);
    }
}

impl MessagingGateway for RecordingGateway {
    async fn send_typing(&self, _conversation: &ConversationId) -> Result<(), GatewayError> {
        self.record(GatewayCall::Typing);
        Ok(())
    }

    async fn send_text(
        &self,
        _conversation: &ConversationId,
        text: &str,
    ) -> Result<MessageRef, GatewayError> {
        self.record(GatewayCall::Text(text.to_string()));
        Ok(MessageRef {
            chat_id: 1,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn send_media(
        &self,
        _conversation: &ConversationId,
        media: MediaPayload,
    ) -> Result<MessageRef, GatewayError> {
        match media {
            MediaPayload::Photo { caption, .. } => self.record(GatewayCall::Photo { caption }),
            MediaPayload::Voice { .. } => self.record(GatewayCall::Voice),
        }
        Ok(MessageRef {
            chat_id: 1,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn edit_text(&self, message: &MessageRef, text: &str) -> Result<(), GatewayError> {
        self.record(GatewayCall::Edit {
            message_id: message.message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), GatewayError> {
        self.record(GatewayCall::Delete {
            message_id: message.message_id,
        });
        Ok(())
    }

    async fn photo_url(&self, _photo: &PhotoRef) -> Result<String, GatewayError> {
        Ok("data:image/jpeg;base64,dGVzdA==".to_string())
    }

    async fn voice_bytes(&self, _voice: &VoiceRef) -> Result<Vec<u8>, GatewayError> {
        Ok(vec![0x4f, 0x67, 0x67])
    }
}

// ---------------------------------------------------------------------------
// Image backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ScriptedImagesInner {
    reject_submit: Option<String>,
    polls: VecDeque<Result<ImagePoll, ProviderError>>,
    submissions: Vec<(String, AspectRatio)>,
}

/// Image backend with a scripted poll sequence.
#[derive(Clone, Default)]
pub(crate) struct ScriptedImages {
    inner: Arc<Mutex<ScriptedImagesInner>>,
}

impl ScriptedImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_submit(&self, message: &str) {
        self.inner.lock().unwrap().reject_submit = Some(message.to_string());
    }

    pub fn push_pending(&self) {
        self.inner
            .lock()
            .unwrap()
            .polls
            .push_back(Ok(ImagePoll::Pending));
    }

    pub fn push_done(&self, image: Option<Vec<u8>>) {
        self.inner
            .lock()
            .unwrap()
            .polls
            .push_back(Ok(ImagePoll::Done { image }));
    }

    pub fn push_poll_error(&self, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .polls
            .push_back(Err(ProviderError::Schema(message.to_string())));
    }

    pub fn submissions(&self) -> Vec<(String, AspectRatio)> {
        self.inner.lock().unwrap().submissions.clone()
    }
}

impl ImageBackend for ScriptedImages {
    async fn submit(
        &self,
        prompt: &str,
        aspect: &AspectRatio,
        _seed: u64,
    ) -> Result<ImageJobHandle, ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = inner.reject_submit.clone() {
            return Err(ProviderError::Api { message });
        }
        inner.submissions.push((prompt.to_string(), aspect.clone()));
        Ok(ImageJobHandle::new("job-1"))
    }

    async fn poll(&self, _handle: &ImageJobHandle) -> Result<ImagePoll, ProviderError> {
        self.inner
            .lock()
            .unwrap()
            .polls
            .pop_front()
            .unwrap_or(Ok(ImagePoll::Pending))
    }
}

// ---------------------------------------------------------------------------
// Speech and moderation
// ---------------------------------------------------------------------------

/// Speech backend with canned answers.
#[derive(Clone, Default)]
pub(crate) struct FixedSpeech;

impl SpeechBackend for FixedSpeech {
    async fn speak(&self, _text: &str) -> Result<Vec<u8>, ProviderError> {
        Ok(b"AUDIO".to_vec())
    }

    async fn transcribe(&self, _audio: &[u8]) -> Result<String, ProviderError> {
        Ok("transcribed text".to_string())
    }
}

/// Moderation backend flagging nothing.
#[derive(Clone, Default)]
pub(crate) struct FixedModeration;

impl ModerationBackend for FixedModeration {
    async fn moderate(&self, _text: &str) -> Result<ModerationVerdict, ProviderError> {
        let mut categories = std::collections::BTreeMap::new();
        categories.insert("violence".to_string(), false);
        let mut category_scores = std::collections::BTreeMap::new();
        category_scores.insert("violence".to_string(), 0.01);
        Ok(ModerationVerdict {
            flagged: false,
            categories,
            category_scores,
        })
    }
}

// ---------------------------------------------------------------------------
// Command context
// ---------------------------------------------------------------------------

/// A full [`CommandContext`] wired to the fakes above.
pub(crate) async fn context_for(
    inbound: InboundMessage,
    repo: MemoryRepo,
    chat: ScriptedChat,
    gateway: RecordingGateway,
    images: ScriptedImages,
) -> CommandContext {
    let session = Arc::new(
        ChatSession::open(
            inbound.conversation.clone(),
            "default role",
            Arc::new(BoxSessionRepository::new(repo)),
            Arc::new(BoxChatBackend::new(chat)),
        )
        .await
        .unwrap(),
    );
    CommandContext {
        session,
        gateway: Arc::new(BoxGateway::new(gateway)),
        speech: Arc::new(BoxSpeechBackend::new(FixedSpeech)),
        moderation: Arc::new(BoxModerationBackend::new(FixedModeration)),
        images: Arc::new(BoxImageBackend::new(images)),
        inbound,
        image_poll_interval: Duration::from_secs(3),
    }
}

/// Context for a plain text prompt, plus the gateway for assertions.
pub(crate) async fn simple_context(text: &str) -> (CommandContext, RecordingGateway) {
    let gateway = RecordingGateway::new();
    let ctx = context_for(
        InboundMessage::text(ConversationId::new("chat1"), text),
        MemoryRepo::new(),
        ScriptedChat::new(),
        gateway.clone(),
        ScriptedImages::new(),
    )
    .await;
    (ctx, gateway)
}
