//! `status` -- reply with the session's usage counters as printed JSON.

use std::future::Future;
use std::pin::Pin;

use moosebot_types::error::{HandlerError, SessionError};

use crate::router::text::strip_prefix_ci;
use crate::router::{Command, CommandContext, Outcome};

pub struct StatusCommand;

impl Command for StatusCommand {
    fn name(&self) -> &'static str {
        "status"
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome, HandlerError>> + Send + 'a>> {
        Box::pin(async move {
            if strip_prefix_ci(ctx.prompt(), "status").is_none() {
                return Ok(Outcome::NotHandled);
            }

            // Counters start at zero for a session with no usage yet.
            let usage = ctx.session.usage().await.unwrap_or_default();
            let report = serde_json::to_string_pretty(&usage)
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            ctx.gateway.send_text(ctx.conversation(), &report).await?;
            Ok(Outcome::Handled)
        })
    }
}
