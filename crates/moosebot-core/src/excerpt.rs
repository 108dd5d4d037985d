//! Background usage checks driving automatic history compaction.
//!
//! One scheduler per session, started by the store at session creation
//! and registered on the session for teardown. Checks are advisory: a
//! failed or missed check is logged and the next tick simply re-evaluates
//! current usage.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::session::ChatSession;

/// Periodic prompt-token check that triggers a destructive excerpt-apply
/// when the configured threshold is crossed.
pub struct ExcerptScheduler {
    cancel: CancellationToken,
    _handle: JoinHandle<()>,
}

impl ExcerptScheduler {
    /// Spawn the check loop. The first check happens one interval after
    /// start, not immediately.
    pub fn spawn(
        session: Arc<ChatSession>,
        check_interval: Duration,
        threshold_tokens: u64,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + check_interval;
            let mut ticker = tokio::time::interval_at(start, check_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        check_once(&session, threshold_tokens).await;
                    }
                }
            }
        });

        Self {
            cancel,
            _handle: handle,
        }
    }

    /// Stop the loop. The task exits at its next suspension point.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

async fn check_once(session: &ChatSession, threshold_tokens: u64) {
    let Some(usage) = session.usage().await else {
        return;
    };
    if usage.prompt_tokens <= threshold_tokens {
        return;
    }

    info!(
        conversation = %session.id(),
        prompt_tokens = usage.prompt_tokens,
        threshold_tokens,
        "making excerpt"
    );
    if let Err(e) = session.excerpt(true).await {
        // Best effort: never let a failed compaction take the process down.
        warn!(conversation = %session.id(), error = %e, "excerpt failed");
    }
}
