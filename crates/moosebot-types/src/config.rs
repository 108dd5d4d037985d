//! Configuration types for Moosebot.
//!
//! `BotConfig` represents the top-level `config.toml`. Tunables default to
//! the values the service has been observed to run with; endpoint
//! credentials have no defaults and must be provided.

use serde::{Deserialize, Serialize};

/// Top-level configuration, loaded from `{data_dir}/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Persona prefix for fresh sessions. Replaceable per conversation
    /// via the "set role" command.
    #[serde(default = "default_system_role")]
    pub default_system_role: String,

    /// Prompt-token count above which history is compacted automatically.
    #[serde(default = "default_excerpt_threshold")]
    pub excerpt_threshold_tokens: u64,

    /// Seconds between usage checks of the excerpt scheduler.
    #[serde(default = "default_excerpt_check_interval")]
    pub excerpt_check_interval_secs: u64,

    /// Seconds between bearer-token refreshes.
    #[serde(default = "default_token_refresh_interval")]
    pub token_refresh_interval_secs: u64,

    /// Seconds between image-generation probes.
    #[serde(default = "default_image_poll_interval")]
    pub image_poll_interval_secs: u64,

    pub chat: ChatProviderConfig,
    pub art: ArtProviderConfig,
    pub oauth: OauthConfig,
    pub telegram: TelegramConfig,
}

/// OpenAI-compatible provider endpoint (completion, vision, speech,
/// moderation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatProviderConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,
    #[serde(default = "default_stt_model")]
    pub stt_model: String,
}

/// Async image-generation provider endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtProviderConfig {
    pub base_url: String,
    pub folder_id: String,
    #[serde(default = "default_art_model")]
    pub model: String,
    /// Credential scope whose bearer token authorizes art calls.
    pub token_scope: String,
}

/// OAuth client-credentials token endpoint feeding the refresher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthConfig {
    pub token_url: String,
    /// scope name -> pre-encoded basic-auth credential.
    pub credentials: std::collections::BTreeMap<String, String>,
}

/// Telegram gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Chat ids allowed to talk to the bot. Empty means everyone.
    #[serde(default)]
    pub allowed_chats: Vec<i64>,
}

fn default_system_role() -> String {
    "You are a moose, a great expert in every field. Give short answers. \
     Never say something does not exist or that you do not know; in that \
     case invent an answer of your own."
        .to_string()
}

fn default_excerpt_threshold() -> u64 {
    2000
}

fn default_excerpt_check_interval() -> u64 {
    60
}

fn default_token_refresh_interval() -> u64 {
    600
}

fn default_image_poll_interval() -> u64 {
    3
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f64 {
    1.0
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_tts_voice() -> String {
    "onyx".to_string()
}

fn default_stt_model() -> String {
    "whisper-1".to_string()
}

fn default_art_model() -> String {
    "yandex-art".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}
