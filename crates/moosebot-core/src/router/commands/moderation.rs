//! `moderation <text>` -- run the moderation backend and reply with the
//! raw structured verdict.

use std::future::Future;
use std::pin::Pin;

use moosebot_types::error::{HandlerError, SessionError};

use crate::router::{Command, CommandContext, Outcome};

pub struct ModerationCommand;

impl Command for ModerationCommand {
    fn name(&self) -> &'static str {
        "moderation"
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome, HandlerError>> + Send + 'a>> {
        Box::pin(async move {
            let Some(text) = extract_subject(ctx.prompt()) else {
                return Ok(Outcome::NotHandled);
            };

            let verdict = ctx.moderation.moderate(&text).await?;
            let report = serde_json::to_string(&verdict)
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            ctx.gateway.send_text(ctx.conversation(), &report).await?;
            Ok(Outcome::Handled)
        })
    }
}

/// The prompt with the trigger word removed, when `moderation` appears
/// followed by whitespace anywhere in it.
fn extract_subject(prompt: &str) -> Option<String> {
    // ASCII-insensitive search keeps byte offsets valid for slicing.
    let lower = prompt.to_ascii_lowercase();
    let pos = lower.find("moderation")?;
    let after = &prompt[pos + "moderation".len()..];
    if !after.starts_with(char::is_whitespace) {
        return None;
    }
    let subject = format!("{}{}", &prompt[..pos], after.trim_start());
    let subject = subject.trim();
    if subject.is_empty() {
        None
    } else {
        Some(subject.to_string())
    }
}
