//! Messaging-gateway data shapes consumed by the core.
//!
//! The gateway transport itself (long polling, file downloads) lives in
//! moosebot-infra; the core only sees these shapes plus the
//! `MessagingGateway` trait in moosebot-core.

use serde::{Deserialize, Serialize};

use crate::chat::ConversationId;

/// Reference to a message the gateway has sent, used for later edits and
/// deletes (progress placeholders).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Reference to a photo attached to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRef(pub String);

/// Reference to a voice note attached to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceRef(pub String);

/// The message an inbound message replies to, when any.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepliedMessage {
    pub text: String,
    pub sender: Option<String>,
    pub photo: Option<PhotoRef>,
}

/// An inbound event delivered by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub conversation: ConversationId,
    pub text: String,
    pub sender: Option<String>,
    pub photo: Option<PhotoRef>,
    pub voice: Option<VoiceRef>,
    pub replied_to: Option<RepliedMessage>,
}

impl InboundMessage {
    /// A plain text message, the common case.
    pub fn text(conversation: ConversationId, text: impl Into<String>) -> Self {
        Self {
            conversation,
            text: text.into(),
            sender: None,
            photo: None,
            voice: None,
            replied_to: None,
        }
    }
}

/// Outbound media payload.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaPayload {
    Photo {
        bytes: Vec<u8>,
        caption: Option<String>,
    },
    Voice {
        bytes: Vec<u8>,
    },
}
