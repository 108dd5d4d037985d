//! Provider backend and gateway trait definitions.
//!
//! Providers are stateless request/response services: they own no
//! conversation state. Implementations live in moosebot-infra.

use moosebot_types::chat::{AspectRatio, ConversationId, HistoryEntry};
use moosebot_types::error::{GatewayError, ProviderError};
use moosebot_types::gateway::{MediaPayload, MessageRef, PhotoRef, VoiceRef};
use moosebot_types::provider::{Completion, ImageJobHandle, ImagePoll, ModerationVerdict};

/// Text-completion backend.
///
/// The system role is prepended at request time and is never part of
/// `history`; `prompt` is the new, not-yet-appended turn.
pub trait ChatBackend: Send + Sync {
    fn complete(
        &self,
        system_role: &str,
        history: &[HistoryEntry],
        prompt: &HistoryEntry,
    ) -> impl std::future::Future<Output = Result<Completion, ProviderError>> + Send;

    /// Vision variant: the prompt is paired with an image the backend can
    /// fetch from `image_url`.
    fn complete_with_image(
        &self,
        system_role: &str,
        history: &[HistoryEntry],
        prompt: &str,
        image_url: &str,
    ) -> impl std::future::Future<Output = Result<Completion, ProviderError>> + Send;
}

/// Text-to-speech and speech-to-text backend.
pub trait SpeechBackend: Send + Sync {
    fn speak(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    fn transcribe(
        &self,
        audio: &[u8],
    ) -> impl std::future::Future<Output = Result<String, ProviderError>> + Send;
}

/// Content-moderation backend.
pub trait ModerationBackend: Send + Sync {
    fn moderate(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<ModerationVerdict, ProviderError>> + Send;
}

/// Asynchronous image-generation backend (submit then poll).
pub trait ImageBackend: Send + Sync {
    /// Submit a generation request. An immediate provider rejection
    /// (content policy, quota) surfaces as `Err`.
    fn submit(
        &self,
        prompt: &str,
        aspect: &AspectRatio,
        seed: u64,
    ) -> impl std::future::Future<Output = Result<ImageJobHandle, ProviderError>> + Send;

    /// Probe an in-flight job once.
    fn poll(
        &self,
        handle: &ImageJobHandle,
    ) -> impl std::future::Future<Output = Result<ImagePoll, ProviderError>> + Send;
}

/// The messaging gateway, as consumed by the core.
///
/// Inbound delivery is the transport's concern; the core only needs the
/// outbound surface plus attachment resolution.
pub trait MessagingGateway: Send + Sync {
    fn send_typing(
        &self,
        conversation: &ConversationId,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    fn send_text(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> impl std::future::Future<Output = Result<MessageRef, GatewayError>> + Send;

    fn send_media(
        &self,
        conversation: &ConversationId,
        media: MediaPayload,
    ) -> impl std::future::Future<Output = Result<MessageRef, GatewayError>> + Send;

    fn edit_text(
        &self,
        message: &MessageRef,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    fn delete_message(
        &self,
        message: &MessageRef,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    /// Resolve a photo reference to a URL a vision backend can fetch,
    /// downscaled to a provider-friendly size.
    fn photo_url(
        &self,
        photo: &PhotoRef,
    ) -> impl std::future::Future<Output = Result<String, GatewayError>> + Send;

    /// Download a voice note for transcription.
    fn voice_bytes(
        &self,
        voice: &VoiceRef,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, GatewayError>> + Send;
}

/// A shared gateway is still a gateway; the transport keeps the original
/// for inbound polling while handlers talk to the same instance.
impl<T: MessagingGateway> MessagingGateway for std::sync::Arc<T> {
    fn send_typing(
        &self,
        conversation: &ConversationId,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send {
        (**self).send_typing(conversation)
    }

    fn send_text(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> impl std::future::Future<Output = Result<MessageRef, GatewayError>> + Send {
        (**self).send_text(conversation, text)
    }

    fn send_media(
        &self,
        conversation: &ConversationId,
        media: MediaPayload,
    ) -> impl std::future::Future<Output = Result<MessageRef, GatewayError>> + Send {
        (**self).send_media(conversation, media)
    }

    fn edit_text(
        &self,
        message: &MessageRef,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send {
        (**self).edit_text(message, text)
    }

    fn delete_message(
        &self,
        message: &MessageRef,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send {
        (**self).delete_message(message)
    }

    fn photo_url(
        &self,
        photo: &PhotoRef,
    ) -> impl std::future::Future<Output = Result<String, GatewayError>> + Send {
        (**self).photo_url(photo)
    }

    fn voice_bytes(
        &self,
        voice: &VoiceRef,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, GatewayError>> + Send {
        (**self).voice_bytes(voice)
    }
}
