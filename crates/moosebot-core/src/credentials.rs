//! Short-lived bearer-token cache with background refresh.
//!
//! Providers read tokens through [`CredentialRefresher::token`]; a single
//! background loop re-fetches every scope on a fixed interval. A failed
//! refresh keeps the previous token in place, so callers see stale
//! credentials rather than none.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use moosebot_types::error::{CredentialError, ProviderError};

/// A fetched bearer token and, when the issuer reports one, its expiry.
#[derive(Debug, Clone)]
pub struct BearerToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Issues bearer tokens for a fixed set of scopes.
pub trait TokenSource: Send + Sync {
    /// Every scope this source can issue tokens for.
    fn scopes(&self) -> Vec<String>;

    fn fetch(
        &self,
        scope: &str,
    ) -> impl std::future::Future<Output = Result<BearerToken, ProviderError>> + Send;
}

/// Scope-keyed token cache, refreshed in the background.
pub struct CredentialRefresher {
    scopes: Vec<String>,
    tokens: Arc<DashMap<String, String>>,
    cancel: CancellationToken,
    _handle: JoinHandle<()>,
}

impl CredentialRefresher {
    /// Fetch every scope once, then spawn the refresh loop.
    ///
    /// Startup fetch failures are logged and left for the loop to retry;
    /// affected scopes answer [`CredentialError::NeverObtained`] until a
    /// fetch succeeds.
    pub async fn start<S>(source: S, refresh_interval: Duration) -> Self
    where
        S: TokenSource + 'static,
    {
        let scopes = source.scopes();
        let tokens: Arc<DashMap<String, String>> = Arc::new(DashMap::new());

        refresh_all(&source, &scopes, &tokens).await;

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task_tokens = tokens.clone();
        let task_scopes = scopes.clone();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + refresh_interval;
            let mut ticker = tokio::time::interval_at(start, refresh_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        refresh_all(&source, &task_scopes, &task_tokens).await;
                    }
                }
            }
        });

        Self {
            scopes,
            tokens,
            cancel,
            _handle: handle,
        }
    }

    /// The current token for `scope`.
    pub fn token(&self, scope: &str) -> Result<String, CredentialError> {
        if !self.scopes.iter().any(|s| s == scope) {
            return Err(CredentialError::UnknownScope {
                scope: scope.to_string(),
            });
        }
        self.tokens
            .get(scope)
            .map(|entry| entry.clone())
            .ok_or_else(|| CredentialError::NeverObtained {
                scope: scope.to_string(),
            })
    }

    /// Stop the refresh loop. Cached tokens stay readable.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

async fn refresh_all<S: TokenSource>(
    source: &S,
    scopes: &[String],
    tokens: &DashMap<String, String>,
) {
    for scope in scopes {
        match source.fetch(scope).await {
            Ok(bearer) => {
                if let Some(expires_at) = bearer.expires_at {
                    info!(scope = %scope, %expires_at, "token refreshed");
                } else {
                    info!(scope = %scope, "token refreshed");
                }
                tokens.insert(scope.clone(), bearer.token);
            }
            Err(e) => {
                warn!(scope = %scope, error = %e, "token refresh failed, keeping previous");
            }
        }
    }
}
