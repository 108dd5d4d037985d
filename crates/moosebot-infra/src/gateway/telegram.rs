//! Telegram Bot API gateway.
//!
//! Long-polls `getUpdates` for inbound messages and implements the
//! outbound `MessagingGateway` surface over the HTTP API. Conversation
//! ids are derived from chat id plus forum topic (`"{chat}"` or
//! `"{chat}:{topic}"`), so a topic thread gets its own session.
//!
//! Photos resolved for the vision path are downscaled to at most 512 px
//! and handed over as a JPEG data URL; the original never leaves this
//! module.

use std::io::Cursor;
use std::sync::atomic::{AtomicI64, Ordering};

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use moosebot_core::provider::MessagingGateway;
use moosebot_types::chat::ConversationId;
use moosebot_types::config::TelegramConfig;
use moosebot_types::error::GatewayError;
use moosebot_types::gateway::{
    InboundMessage, MediaPayload, MessageRef, PhotoRef, RepliedMessage, VoiceRef,
};

/// Longest side of a photo handed to the vision backend.
const VISION_PHOTO_MAX_PX: u32 = 512;

pub struct TelegramGateway {
    http: reqwest::Client,
    config: TelegramConfig,
    api_base: String,
    offset: AtomicI64,
}

impl TelegramGateway {
    pub fn new(http: reqwest::Client, config: TelegramConfig) -> Self {
        Self {
            http,
            config,
            api_base: "https://api.telegram.org".to_string(),
            offset: AtomicI64::new(0),
        }
    }

    /// One long-poll round: blocks up to the configured timeout, returns
    /// the inbound messages from allowed chats (possibly none).
    pub async fn poll_updates(&self) -> Result<Vec<InboundMessage>, GatewayError> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &GetUpdates {
                    offset: self.offset.load(Ordering::SeqCst),
                    timeout: self.config.poll_timeout_secs,
                    allowed_updates: &["message"],
                },
            )
            .await?;

        let mut inbound = Vec::new();
        for update in updates {
            self.offset.store(update.update_id + 1, Ordering::SeqCst);
            let Some(message) = update.message else {
                continue;
            };
            if !self.chat_allowed(message.chat.id) {
                debug!(chat_id = message.chat.id, "chat not allowed, dropping");
                continue;
            }
            inbound.push(message.into_inbound());
        }
        Ok(inbound)
    }

    fn chat_allowed(&self, chat_id: i64) -> bool {
        self.config.allowed_chats.is_empty() || self.config.allowed_chats.contains(&chat_id)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.config.bot_token)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
    ) -> Result<T, GatewayError> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| GatewayError::Schema(e.to_string()))?;
        parsed.into_result(method)
    }

    async fn call_multipart<T: DeserializeOwned>(
        &self,
        method: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, GatewayError> {
        let response = self
            .http
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| GatewayError::Schema(e.to_string()))?;
        parsed.into_result(method)
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, GatewayError> {
        let file: ApiFile = self.call("getFile", &GetFile { file_id }).await?;
        let path = file
            .file_path
            .ok_or_else(|| GatewayError::Schema("getFile returned no path".to_string()))?;

        let url = format!(
            "{}/file/bot{}/{path}",
            self.api_base, self.config.bot_token
        );
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(GatewayError::Api(format!(
                "file download failed: {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl MessagingGateway for TelegramGateway {
    async fn send_typing(&self, conversation: &ConversationId) -> Result<(), GatewayError> {
        let target = Target::parse(conversation)?;
        // Telegram answers `true` here, not a message object.
        let _: bool = self
            .call(
                "sendChatAction",
                &SendChatAction {
                    chat_id: target.chat_id,
                    message_thread_id: target.thread_id,
                    action: "typing",
                },
            )
            .await?;
        Ok(())
    }

    async fn send_text(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<MessageRef, GatewayError> {
        let target = Target::parse(conversation)?;
        let sent: SentMessage = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id: target.chat_id,
                    message_thread_id: target.thread_id,
                    text,
                },
            )
            .await?;
        Ok(MessageRef {
            chat_id: target.chat_id,
            message_id: sent.message_id,
        })
    }

    async fn send_media(
        &self,
        conversation: &ConversationId,
        media: MediaPayload,
    ) -> Result<MessageRef, GatewayError> {
        let target = Target::parse(conversation)?;
        let mut form = reqwest::multipart::Form::new().text("chat_id", target.chat_id.to_string());
        if let Some(thread_id) = target.thread_id {
            form = form.text("message_thread_id", thread_id.to_string());
        }

        let (method, form) = match media {
            MediaPayload::Photo { bytes, caption } => {
                let mut form = form.part(
                    "photo",
                    reqwest::multipart::Part::bytes(bytes)
                        .file_name("image.jpg")
                        .mime_str("image/jpeg")
                        .map_err(|e| GatewayError::Schema(e.to_string()))?,
                );
                if let Some(caption) = caption {
                    form = form.text("caption", caption);
                }
                ("sendPhoto", form)
            }
            MediaPayload::Voice { bytes } => (
                "sendVoice",
                form.part(
                    "voice",
                    reqwest::multipart::Part::bytes(bytes)
                        .file_name("voice.ogg")
                        .mime_str("audio/ogg")
                        .map_err(|e| GatewayError::Schema(e.to_string()))?,
                ),
            ),
        };

        let sent: SentMessage = self.call_multipart(method, form).await?;
        Ok(MessageRef {
            chat_id: target.chat_id,
            message_id: sent.message_id,
        })
    }

    async fn edit_text(&self, message: &MessageRef, text: &str) -> Result<(), GatewayError> {
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessageText {
                    chat_id: message.chat_id,
                    message_id: message.message_id,
                    text,
                },
            )
            .await?;
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), GatewayError> {
        let _: bool = self
            .call(
                "deleteMessage",
                &DeleteMessage {
                    chat_id: message.chat_id,
                    message_id: message.message_id,
                },
            )
            .await?;
        Ok(())
    }

    async fn photo_url(&self, photo: &PhotoRef) -> Result<String, GatewayError> {
        let original = self.download_file(&photo.0).await?;
        let encoded = downscale_to_jpeg(&original)
            .map_err(|e| GatewayError::Schema(format!("photo decode: {e}")))?;
        Ok(format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(encoded)
        ))
    }

    async fn voice_bytes(&self, voice: &VoiceRef) -> Result<Vec<u8>, GatewayError> {
        self.download_file(&voice.0).await
    }
}

/// Shrink to the vision-friendly size and re-encode as JPEG.
fn downscale_to_jpeg(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    let img = if img.width() > VISION_PHOTO_MAX_PX || img.height() > VISION_PHOTO_MAX_PX {
        img.thumbnail(VISION_PHOTO_MAX_PX, VISION_PHOTO_MAX_PX)
    } else {
        img
    };
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)?;
    Ok(out)
}

/// A conversation id broken back into its Telegram coordinates.
struct Target {
    chat_id: i64,
    thread_id: Option<i64>,
}

impl Target {
    fn parse(conversation: &ConversationId) -> Result<Self, GatewayError> {
        let id = conversation.as_str();
        let (chat, thread) = match id.split_once(':') {
            Some((chat, thread)) => (chat, Some(thread)),
            None => (id, None),
        };
        let chat_id = chat
            .parse()
            .map_err(|_| GatewayError::Api(format!("not a telegram conversation: '{id}'")))?;
        let thread_id = match thread {
            Some(thread) => Some(thread.parse().map_err(|_| {
                GatewayError::Api(format!("not a telegram conversation: '{id}'"))
            })?),
            None => None,
        };
        Ok(Self { chat_id, thread_id })
    }
}

// --- wire shapes ---

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T, GatewayError> {
        if !self.ok {
            let description = self.description.unwrap_or_else(|| "no description".to_string());
            warn!(method, %description, "api call rejected");
            return Err(GatewayError::Api(format!("{method}: {description}")));
        }
        self.result
            .ok_or_else(|| GatewayError::Schema(format!("{method}: ok without result")))
    }
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct GetFile<'a> {
    file_id: &'a str,
}

#[derive(Deserialize)]
struct ApiFile {
    file_path: Option<String>,
}

#[derive(Serialize)]
struct SendChatAction<'a> {
    chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
    action: &'a str,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
    text: &'a str,
}

#[derive(Serialize)]
struct EditMessageText<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
}

#[derive(Serialize)]
struct DeleteMessage {
    chat_id: i64,
    message_id: i64,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[derive(Deserialize)]
struct Update {
    update_id: i64,
    message: Option<TgMessage>,
}

#[derive(Deserialize)]
struct TgMessage {
    chat: TgChat,
    #[serde(default)]
    message_thread_id: Option<i64>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    from: Option<TgUser>,
    #[serde(default)]
    photo: Option<Vec<TgPhotoSize>>,
    #[serde(default)]
    voice: Option<TgVoice>,
    #[serde(default)]
    reply_to_message: Option<Box<TgMessage>>,
}

impl TgMessage {
    fn conversation(&self) -> ConversationId {
        match self.message_thread_id {
            Some(thread_id) => ConversationId::new(format!("{}:{thread_id}", self.chat.id)),
            None => ConversationId::new(self.chat.id.to_string()),
        }
    }

    /// The largest available rendition of an attached photo.
    fn best_photo(&self) -> Option<PhotoRef> {
        self.photo
            .as_ref()?
            .iter()
            .max_by_key(|size| size.width * size.height)
            .map(|size| PhotoRef(size.file_id.clone()))
    }

    fn sender_name(&self) -> Option<String> {
        let from = self.from.as_ref()?;
        from.username
            .clone()
            .or_else(|| Some(from.first_name.clone()))
    }

    fn into_inbound(self) -> InboundMessage {
        let replied_to = self.reply_to_message.as_deref().map(|replied| RepliedMessage {
            text: replied
                .text
                .clone()
                .or_else(|| replied.caption.clone())
                .unwrap_or_default(),
            sender: replied.sender_name(),
            photo: replied.best_photo(),
        });

        InboundMessage {
            conversation: self.conversation(),
            text: self
                .text
                .clone()
                .or_else(|| self.caption.clone())
                .unwrap_or_default(),
            sender: self.sender_name(),
            photo: self.best_photo(),
            voice: self.voice.as_ref().map(|voice| VoiceRef(voice.file_id.clone())),
            replied_to,
        }
    }
}

#[derive(Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Deserialize)]
struct TgUser {
    first_name: String,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Deserialize)]
struct TgPhotoSize {
    file_id: String,
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct TgVoice {
    file_id: String,
}
