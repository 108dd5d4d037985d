//! Object-safe dynamic-dispatch wrappers for the capability traits.
//!
//! The capability traits use RPITIT and cannot be trait objects directly.
//! Each gets the same treatment:
//! 1. an object-safe `*Dyn` trait with boxed futures,
//! 2. a blanket impl of `*Dyn` for every implementor of the real trait,
//! 3. a `Box*` wrapper delegating to the inner trait object.

use std::future::Future;
use std::pin::Pin;

use moosebot_types::chat::{AspectRatio, ConversationId, HistoryEntry};
use moosebot_types::error::{GatewayError, ProviderError};
use moosebot_types::gateway::{MediaPayload, MessageRef, PhotoRef, VoiceRef};
use moosebot_types::provider::{Completion, ImageJobHandle, ImagePoll, ModerationVerdict};

use super::backend::{ChatBackend, ImageBackend, MessagingGateway, ModerationBackend, SpeechBackend};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

trait ChatBackendDyn: Send + Sync {
    fn complete_boxed<'a>(
        &'a self,
        system_role: &'a str,
        history: &'a [HistoryEntry],
        prompt: &'a HistoryEntry,
    ) -> BoxFuture<'a, Result<Completion, ProviderError>>;

    fn complete_with_image_boxed<'a>(
        &'a self,
        system_role: &'a str,
        history: &'a [HistoryEntry],
        prompt: &'a str,
        image_url: &'a str,
    ) -> BoxFuture<'a, Result<Completion, ProviderError>>;
}

impl<T: ChatBackend> ChatBackendDyn for T {
    fn complete_boxed<'a>(
        &'a self,
        system_role: &'a str,
        history: &'a [HistoryEntry],
        prompt: &'a HistoryEntry,
    ) -> BoxFuture<'a, Result<Completion, ProviderError>> {
        Box::pin(self.complete(system_role, history, prompt))
    }

    fn complete_with_image_boxed<'a>(
        &'a self,
        system_role: &'a str,
        history: &'a [HistoryEntry],
        prompt: &'a str,
        image_url: &'a str,
    ) -> BoxFuture<'a, Result<Completion, ProviderError>> {
        Box::pin(self.complete_with_image(system_role, history, prompt, image_url))
    }
}

/// Type-erased [`ChatBackend`].
pub struct BoxChatBackend {
    inner: Box<dyn ChatBackendDyn>,
}

impl BoxChatBackend {
    pub fn new<T: ChatBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    pub async fn complete(
        &self,
        system_role: &str,
        history: &[HistoryEntry],
        prompt: &HistoryEntry,
    ) -> Result<Completion, ProviderError> {
        self.inner.complete_boxed(system_role, history, prompt).await
    }

    pub async fn complete_with_image(
        &self,
        system_role: &str,
        history: &[HistoryEntry],
        prompt: &str,
        image_url: &str,
    ) -> Result<Completion, ProviderError> {
        self.inner
            .complete_with_image_boxed(system_role, history, prompt, image_url)
            .await
    }
}

// ---------------------------------------------------------------------------
// Speech
// ---------------------------------------------------------------------------

trait SpeechBackendDyn: Send + Sync {
    fn speak_boxed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>>;

    fn transcribe_boxed<'a>(
        &'a self,
        audio: &'a [u8],
    ) -> BoxFuture<'a, Result<String, ProviderError>>;
}

impl<T: SpeechBackend> SpeechBackendDyn for T {
    fn speak_boxed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>> {
        Box::pin(self.speak(text))
    }

    fn transcribe_boxed<'a>(
        &'a self,
        audio: &'a [u8],
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(self.transcribe(audio))
    }
}

/// Type-erased [`SpeechBackend`].
pub struct BoxSpeechBackend {
    inner: Box<dyn SpeechBackendDyn>,
}

impl BoxSpeechBackend {
    pub fn new<T: SpeechBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    pub async fn speak(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        self.inner.speak_boxed(text).await
    }

    pub async fn transcribe(&self, audio: &[u8]) -> Result<String, ProviderError> {
        self.inner.transcribe_boxed(audio).await
    }
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

trait ModerationBackendDyn: Send + Sync {
    fn moderate_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> BoxFuture<'a, Result<ModerationVerdict, ProviderError>>;
}

impl<T: ModerationBackend> ModerationBackendDyn for T {
    fn moderate_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> BoxFuture<'a, Result<ModerationVerdict, ProviderError>> {
        Box::pin(self.moderate(text))
    }
}

/// Type-erased [`ModerationBackend`].
pub struct BoxModerationBackend {
    inner: Box<dyn ModerationBackendDyn>,
}

impl BoxModerationBackend {
    pub fn new<T: ModerationBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    pub async fn moderate(&self, text: &str) -> Result<ModerationVerdict, ProviderError> {
        self.inner.moderate_boxed(text).await
    }
}

// ---------------------------------------------------------------------------
// Image generation
// ---------------------------------------------------------------------------

trait ImageBackendDyn: Send + Sync {
    fn submit_boxed<'a>(
        &'a self,
        prompt: &'a str,
        aspect: &'a AspectRatio,
        seed: u64,
    ) -> BoxFuture<'a, Result<ImageJobHandle, ProviderError>>;

    fn poll_boxed<'a>(
        &'a self,
        handle: &'a ImageJobHandle,
    ) -> BoxFuture<'a, Result<ImagePoll, ProviderError>>;
}

impl<T: ImageBackend> ImageBackendDyn for T {
    fn submit_boxed<'a>(
        &'a self,
        prompt: &'a str,
        aspect: &'a AspectRatio,
        seed: u64,
    ) -> BoxFuture<'a, Result<ImageJobHandle, ProviderError>> {
        Box::pin(self.submit(prompt, aspect, seed))
    }

    fn poll_boxed<'a>(
        &'a self,
        handle: &'a ImageJobHandle,
    ) -> BoxFuture<'a, Result<ImagePoll, ProviderError>> {
        Box::pin(self.poll(handle))
    }
}

/// Type-erased [`ImageBackend`].
pub struct BoxImageBackend {
    inner: Box<dyn ImageBackendDyn>,
}

impl BoxImageBackend {
    pub fn new<T: ImageBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    pub async fn submit(
        &self,
        prompt: &str,
        aspect: &AspectRatio,
        seed: u64,
    ) -> Result<ImageJobHandle, ProviderError> {
        self.inner.submit_boxed(prompt, aspect, seed).await
    }

    pub async fn poll(&self, handle: &ImageJobHandle) -> Result<ImagePoll, ProviderError> {
        self.inner.poll_boxed(handle).await
    }
}

// ---------------------------------------------------------------------------
// Messaging gateway
// ---------------------------------------------------------------------------

trait MessagingGatewayDyn: Send + Sync {
    fn send_typing_boxed<'a>(
        &'a self,
        conversation: &'a ConversationId,
    ) -> BoxFuture<'a, Result<(), GatewayError>>;

    fn send_text_boxed<'a>(
        &'a self,
        conversation: &'a ConversationId,
        text: &'a str,
    ) -> BoxFuture<'a, Result<MessageRef, GatewayError>>;

    fn send_media_boxed<'a>(
        &'a self,
        conversation: &'a ConversationId,
        media: MediaPayload,
    ) -> BoxFuture<'a, Result<MessageRef, GatewayError>>;

    fn edit_text_boxed<'a>(
        &'a self,
        message: &'a MessageRef,
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), GatewayError>>;

    fn delete_message_boxed<'a>(
        &'a self,
        message: &'a MessageRef,
    ) -> BoxFuture<'a, Result<(), GatewayError>>;

    fn photo_url_boxed<'a>(
        &'a self,
        photo: &'a PhotoRef,
    ) -> BoxFuture<'a, Result<String, GatewayError>>;

    fn voice_bytes_boxed<'a>(
        &'a self,
        voice: &'a VoiceRef,
    ) -> BoxFuture<'a, Result<Vec<u8>, GatewayError>>;
}

impl<T: MessagingGateway> MessagingGatewayDyn for T {
    fn send_typing_boxed<'a>(
        &'a self,
        conversation: &'a ConversationId,
    ) -> BoxFuture<'a, Result<(), GatewayError>> {
        Box::pin(self.send_typing(conversation))
    }

    fn send_text_boxed<'a>(
        &'a self,
        conversation: &'a ConversationId,
        text: &'a str,
    ) -> BoxFuture<'a, Result<MessageRef, GatewayError>> {
        Box::pin(self.send_text(conversation, text))
    }

    fn send_media_boxed<'a>(
        &'a self,
        conversation: &'a ConversationId,
        media: MediaPayload,
    ) -> BoxFuture<'a, Result<MessageRef, GatewayError>> {
        Box::pin(self.send_media(conversation, media))
    }

    fn edit_text_boxed<'a>(
        &'a self,
        message: &'a MessageRef,
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), GatewayError>> {
        Box::pin(self.edit_text(message, text))
    }

    fn delete_message_boxed<'a>(
        &'a self,
        message: &'a MessageRef,
    ) -> BoxFuture<'a, Result<(), GatewayError>> {
        Box::pin(self.delete_message(message))
    }

    fn photo_url_boxed<'a>(
        &'a self,
        photo: &'a PhotoRef,
    ) -> BoxFuture<'a, Result<String, GatewayError>> {
        Box::pin(self.photo_url(photo))
    }

    fn voice_bytes_boxed<'a>(
        &'a self,
        voice: &'a VoiceRef,
    ) -> BoxFuture<'a, Result<Vec<u8>, GatewayError>> {
        Box::pin(self.voice_bytes(voice))
    }
}

/// Type-erased [`MessagingGateway`].
pub struct BoxGateway {
    inner: Box<dyn MessagingGatewayDyn>,
}

impl BoxGateway {
    pub fn new<T: MessagingGateway + 'static>(gateway: T) -> Self {
        Self {
            inner: Box::new(gateway),
        }
    }

    pub async fn send_typing(&self, conversation: &ConversationId) -> Result<(), GatewayError> {
        self.inner.send_typing_boxed(conversation).await
    }

    pub async fn send_text(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<MessageRef, GatewayError> {
        self.inner.send_text_boxed(conversation, text).await
    }

    pub async fn send_media(
        &self,
        conversation: &ConversationId,
        media: MediaPayload,
    ) -> Result<MessageRef, GatewayError> {
        self.inner.send_media_boxed(conversation, media).await
    }

    pub async fn edit_text(&self, message: &MessageRef, text: &str) -> Result<(), GatewayError> {
        self.inner.edit_text_boxed(message, text).await
    }

    pub async fn delete_message(&self, message: &MessageRef) -> Result<(), GatewayError> {
        self.inner.delete_message_boxed(message).await
    }

    pub async fn photo_url(&self, photo: &PhotoRef) -> Result<String, GatewayError> {
        self.inner.photo_url_boxed(photo).await
    }

    pub async fn voice_bytes(&self, voice: &VoiceRef) -> Result<Vec<u8>, GatewayError> {
        self.inner.voice_bytes_boxed(voice).await
    }
}
