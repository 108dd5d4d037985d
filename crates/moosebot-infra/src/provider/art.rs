//! Async image-generation backend (submit then poll).
//!
//! `base_url` is the API host root: submissions go to
//! `{base_url}/foundationModels/v1/imageGenerationAsync`, probes to
//! `{base_url}/operations/{id}`. Calls authenticate with the bearer
//! token of the configured credential scope, so a draw fails cleanly
//! while the refresher has not yet obtained one.

use std::sync::Arc;

use base64::Engine;
use serde::{Deserialize, Serialize};

use moosebot_core::credentials::CredentialRefresher;
use moosebot_core::provider::ImageBackend;
use moosebot_types::chat::AspectRatio;
use moosebot_types::config::ArtProviderConfig;
use moosebot_types::error::ProviderError;
use moosebot_types::provider::{ImageJobHandle, ImagePoll};

use super::{api_error, transport_error};

pub struct ArtBackend {
    http: reqwest::Client,
    config: ArtProviderConfig,
    credentials: Arc<CredentialRefresher>,
}

impl ArtBackend {
    pub fn new(
        http: reqwest::Client,
        config: ArtProviderConfig,
        credentials: Arc<CredentialRefresher>,
    ) -> Self {
        Self {
            http,
            config,
            credentials,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn bearer(&self) -> Result<String, ProviderError> {
        Ok(self.credentials.token(&self.config.token_scope)?)
    }
}

impl ImageBackend for ArtBackend {
    async fn submit(
        &self,
        prompt: &str,
        aspect: &AspectRatio,
        seed: u64,
    ) -> Result<ImageJobHandle, ProviderError> {
        let request = SubmitRequest {
            model_uri: format!(
                "art://{}/{}/latest",
                self.config.folder_id, self.config.model
            ),
            generation_options: GenerationOptions {
                seed: seed.to_string(),
                aspect_ratio: WireAspectRatio {
                    width_ratio: aspect.width.clone(),
                    height_ratio: aspect.height.clone(),
                },
            },
            messages: vec![SubmitMessage {
                weight: "1".to_string(),
                text: prompt.to_string(),
            }],
        };

        let response = self
            .http
            .post(self.endpoint("foundationModels/v1/imageGenerationAsync"))
            .bearer_auth(self.bearer()?)
            .header("x-folder-id", &self.config.folder_id)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Schema(e.to_string()))?;
        match parsed {
            SubmitResponse::Accepted { id } => Ok(ImageJobHandle::new(id)),
            SubmitResponse::Rejected { message } => Err(ProviderError::Api { message }),
        }
    }

    async fn poll(&self, handle: &ImageJobHandle) -> Result<ImagePoll, ProviderError> {
        let response = self
            .http
            .get(self.endpoint(&format!("operations/{}", handle.as_str())))
            .bearer_auth(self.bearer()?)
            .header("x-folder-id", &self.config.folder_id)
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: PollResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Schema(e.to_string()))?;
        parsed.into_poll()
    }
}

// --- wire shapes ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    model_uri: String,
    generation_options: GenerationOptions,
    messages: Vec<SubmitMessage>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationOptions {
    seed: String,
    aspect_ratio: WireAspectRatio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireAspectRatio {
    width_ratio: String,
    height_ratio: String,
}

#[derive(Serialize)]
struct SubmitMessage {
    weight: String,
    text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SubmitResponse {
    Accepted { id: String },
    /// Provider-level rejection delivered in-band (content policy, quota).
    Rejected { message: String },
}

#[derive(Deserialize)]
struct PollResponse {
    done: bool,
    #[serde(default)]
    response: Option<PollPayload>,
    #[serde(default)]
    error: Option<PollError>,
}

#[derive(Deserialize)]
struct PollPayload {
    #[serde(default)]
    image: Option<String>,
}

#[derive(Deserialize)]
struct PollError {
    message: String,
}

impl PollResponse {
    fn into_poll(self) -> Result<ImagePoll, ProviderError> {
        if let Some(error) = self.error {
            return Err(ProviderError::Api {
                message: error.message,
            });
        }
        if !self.done {
            return Ok(ImagePoll::Pending);
        }
        let image = match self.response.and_then(|payload| payload.image) {
            Some(encoded) => Some(
                base64::engine::general_purpose::STANDARD
                    .decode(encoded)
                    .map_err(|e| ProviderError::Schema(format!("image payload: {e}")))?,
            ),
            None => None,
        };
        Ok(ImagePoll::Done { image })
    }
}
