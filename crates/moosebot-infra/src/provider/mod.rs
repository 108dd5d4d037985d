//! Provider backend HTTP clients.
//!
//! [`OpenAiBackend`] covers the OpenAI-compatible surface (completion,
//! vision, speech, moderation); [`ArtBackend`] covers the async
//! submit-then-poll image generation API.

mod art;
mod openai;

pub use art::ArtBackend;
pub use openai::OpenAiBackend;

use moosebot_types::error::ProviderError;

/// Turn a non-success HTTP response into [`ProviderError::Api`] carrying
/// the status and whatever body the provider sent.
pub(crate) async fn api_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ProviderError::Api {
        message: format!("{status}: {}", body.trim()),
    }
}

pub(crate) fn transport_error(e: reqwest::Error) -> ProviderError {
    ProviderError::Http(e.to_string())
}
