//! OAuth client-credentials token source.
//!
//! One POST per scope: form body `scope=<name>`, pre-encoded basic-auth
//! credential, and a fresh `RqUID` per request. The response carries the
//! access token and a millisecond expiry timestamp.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use moosebot_core::credentials::{BearerToken, TokenSource};
use moosebot_types::config::OauthConfig;
use moosebot_types::error::{CredentialError, ProviderError};

use crate::provider::{api_error, transport_error};

pub struct OauthTokenSource {
    http: reqwest::Client,
    config: OauthConfig,
}

impl OauthTokenSource {
    pub fn new(http: reqwest::Client, config: OauthConfig) -> Self {
        Self { http, config }
    }
}

impl TokenSource for OauthTokenSource {
    fn scopes(&self) -> Vec<String> {
        self.config.credentials.keys().cloned().collect()
    }

    async fn fetch(&self, scope: &str) -> Result<BearerToken, ProviderError> {
        let basic = self
            .config
            .credentials
            .get(scope)
            .ok_or_else(|| CredentialError::UnknownScope {
                scope: scope.to_string(),
            })?;

        let response = self
            .http
            .post(&self.config.token_url)
            .header("Authorization", format!("Basic {basic}"))
            .header("RqUID", Uuid::new_v4().to_string())
            .header("Accept", "application/json")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(format!("scope={scope}"))
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Schema(e.to_string()))?;
        Ok(BearerToken {
            token: parsed.access_token,
            expires_at: parsed
                .expires_at
                .and_then(DateTime::<Utc>::from_timestamp_millis),
        })
    }
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    /// Unix milliseconds; some issuers omit it.
    #[serde(default)]
    expires_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_with(credentials: &[(&str, &str)]) -> OauthTokenSource {
        OauthTokenSource::new(
            reqwest::Client::new(),
            OauthConfig {
                token_url: "https://auth.example.com/oauth".to_string(),
                credentials: credentials
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        )
    }

    #[test]
    fn scopes_mirror_the_configured_credentials() {
        let source = source_with(&[("CHAT_API", "aaa"), ("ART_API", "bbb")]);
        let mut scopes = source.scopes();
        scopes.sort();
        assert_eq!(scopes, vec!["ART_API".to_string(), "CHAT_API".to_string()]);
    }

    #[tokio::test]
    async fn unconfigured_scope_is_rejected_without_a_request() {
        let source = source_with(&[("CHAT_API", "aaa")]);
        let err = source.fetch("ART_API").await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Credential(CredentialError::UnknownScope { .. })
        ));
    }

    #[test]
    fn token_response_parses_with_and_without_expiry() {
        let parsed: AccessTokenResponse =
            serde_json::from_str(r#"{ "access_token": "t1", "expires_at": 1756400000000 }"#)
                .unwrap();
        assert_eq!(parsed.access_token, "t1");
        let expires = DateTime::<Utc>::from_timestamp_millis(parsed.expires_at.unwrap()).unwrap();
        assert!(expires > DateTime::<Utc>::from_timestamp_millis(0).unwrap());

        let parsed: AccessTokenResponse =
            serde_json::from_str(r#"{ "access_token": "t2" }"#).unwrap();
        assert!(parsed.expires_at.is_none());
    }
}
