//! Conversation-state types for Moosebot.
//!
//! These types model the per-conversation state the engine keeps: the
//! conversation key, the role-tagged message history sent back to the
//! completion provider, the last-known usage counters, and the persisted
//! record shape.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable key for a conversation thread.
///
/// Derived externally from chat + topic identity (the gateway's concern);
/// the core treats it as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Role of a history entry in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::System => write!(f, "system"),
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(ChatRole::System),
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(format!("invalid chat role: '{other}'")),
        }
    }
}

/// A single conversational turn kept in history.
///
/// Content is always non-empty derived text; binary payloads (photos,
/// voice) are never retained here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub content: String,
    /// Display name of the speaker, when known (user turns only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>, name: Option<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            name,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            name: None,
        }
    }
}

/// Last-known resource consumption, as reported by the completion provider.
///
/// Replaced wholesale after each provider call that reports usage.
/// `total = prompt + completion` is expected but not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// The persisted per-conversation record.
///
/// Loaded wholesale at session creation, written wholesale after every
/// mutating operation. The system role is stored separately from history
/// and prepended at request time, never inside the history sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(rename = "systemRole")]
    pub system_role: String,
    pub history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSnapshot>,
}

impl SessionState {
    /// Fresh state seeded with a default system role.
    pub fn new(default_system_role: impl Into<String>) -> Self {
        Self {
            system_role: default_system_role.into(),
            history: Vec::new(),
            usage: None,
        }
    }
}

/// Width:height hint parsed out of a draw prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: String,
    pub height: String,
}

impl Default for AspectRatio {
    /// Square, used when the prompt carries no ratio.
    fn default() -> Self {
        Self {
            width: "1".to_string(),
            height: "1".to_string(),
        }
    }
}

impl AspectRatio {
    /// Extract an aspect ratio from a prompt.
    ///
    /// A ratio is a standalone `W/H` token with both sides numeric. When
    /// several appear, the last one wins. Returns the ratio (default `1/1`
    /// when absent) and the prompt with all ratio tokens removed.
    pub fn extract(prompt: &str) -> (Self, String) {
        let mut ratio = None;
        let mut kept: Vec<&str> = Vec::new();

        for token in prompt.split_whitespace() {
            match parse_ratio_token(token) {
                Some(r) => ratio = Some(r),
                None => kept.push(token),
            }
        }

        (ratio.unwrap_or_default(), kept.join(" "))
    }
}

fn parse_ratio_token(token: &str) -> Option<AspectRatio> {
    // A ratio may abut punctuation ("16/9.", "(16/9)").
    let token = token.trim_matches(|c: char| c.is_ascii_punctuation() && c != '/');
    let (width, height) = token.split_once('/')?;
    if width.is_empty() || height.is_empty() {
        return None;
    }
    if !width.bytes().all(|b| b.is_ascii_digit()) || !height.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(AspectRatio {
        width: width.to_string(),
        height: height.to_string(),
    })
}
