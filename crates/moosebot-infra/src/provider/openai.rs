//! OpenAI-compatible backend: completion, vision, speech, moderation.
//!
//! One client for the whole surface; endpoints differ only in path and
//! payload shape. The system role is prepended to the wire messages at
//! request time and never persisted inside history.

use reqwest::multipart;
use serde::{Deserialize, Serialize};

use moosebot_core::provider::{ChatBackend, ModerationBackend, SpeechBackend};
use moosebot_types::chat::{HistoryEntry, UsageSnapshot};
use moosebot_types::config::ChatProviderConfig;
use moosebot_types::error::ProviderError;
use moosebot_types::provider::{Completion, ModerationVerdict};

use super::{api_error, transport_error};

#[derive(Clone)]
pub struct OpenAiBackend {
    http: reqwest::Client,
    config: ChatProviderConfig,
}

impl OpenAiBackend {
    pub fn new(http: reqwest::Client, config: ChatProviderConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn chat_request(&self, messages: Vec<WireMessage>) -> Result<Completion, ProviderError> {
        let request = ChatRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages,
        };

        let response = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Schema(e.to_string()))?;
        parsed.into_completion()
    }

    fn wire_history(&self, system_role: &str, history: &[HistoryEntry]) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage {
            role: "system".to_string(),
            content: MessageContent::Text(system_role.to_string()),
            name: None,
        });
        messages.extend(history.iter().map(WireMessage::from_entry));
        messages
    }
}

impl ChatBackend for OpenAiBackend {
    async fn complete(
        &self,
        system_role: &str,
        history: &[HistoryEntry],
        prompt: &HistoryEntry,
    ) -> Result<Completion, ProviderError> {
        let mut messages = self.wire_history(system_role, history);
        messages.push(WireMessage::from_entry(prompt));
        self.chat_request(messages).await
    }

    async fn complete_with_image(
        &self,
        system_role: &str,
        history: &[HistoryEntry],
        prompt: &str,
        image_url: &str,
    ) -> Result<Completion, ProviderError> {
        let mut messages = self.wire_history(system_role, history);
        messages.push(WireMessage {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: prompt.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.to_string(),
                    },
                },
            ]),
            name: None,
        });
        self.chat_request(messages).await
    }
}

impl SpeechBackend for OpenAiBackend {
    async fn speak(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        let request = SpeechRequest {
            model: &self.config.tts_model,
            voice: &self.config.tts_voice,
            input: text,
        };
        let response = self
            .http
            .post(self.endpoint("audio/speech"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }

    async fn transcribe(&self, audio: &[u8]) -> Result<String, ProviderError> {
        let form = multipart::Form::new()
            .text("model", self.config.stt_model.clone())
            .part(
                "file",
                multipart::Part::bytes(audio.to_vec())
                    .file_name("voice.ogg")
                    .mime_str("audio/ogg")
                    .map_err(|e| ProviderError::Schema(e.to_string()))?,
            );

        let response = self
            .http
            .post(self.endpoint("audio/transcriptions"))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Schema(e.to_string()))?;
        Ok(parsed.text)
    }
}

impl ModerationBackend for OpenAiBackend {
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, ProviderError> {
        let response = self
            .http
            .post(self.endpoint("moderations"))
            .bearer_auth(&self.config.api_key)
            .json(&ModerationRequest { input: text })
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: ModerationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Schema(e.to_string()))?;
        parsed
            .results
            .into_iter()
            .next()
            .ok_or(ProviderError::Empty)
    }
}

// --- wire shapes ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<WireMessage>,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: MessageContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl WireMessage {
    fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            role: entry.role.to_string(),
            content: MessageContent::Text(entry.content.clone()),
            name: entry.name.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

impl ChatResponse {
    fn into_completion(self) -> Result<Completion, ProviderError> {
        let usage = self.usage.map(|u| UsageSnapshot {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(ProviderError::Empty)?;
        Ok(Completion { text, usage })
    }
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Serialize)]
struct ModerationRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationVerdict>,
}
