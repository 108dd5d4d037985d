//! The command set, one module per intent.
//!
//! Listed here in dispatch order. Narrow patterns (status, excerpt,
//! role) sit before the broader media commands; the conversational
//! default closes the list and always handles.

pub mod default;
pub mod draw;
pub mod excerpt;
pub mod look;
pub mod moderation;
pub mod role;
pub mod status;

use moosebot_types::error::SessionError;

use super::CommandContext;

/// Feed the replied-to message's text into history as user context, so
/// the completion backend sees what the prompt refers to.
async fn add_replied_context(ctx: &CommandContext) -> Result<(), SessionError> {
    if let Some(replied) = &ctx.inbound.replied_to {
        ctx.session
            .add_user_context(&replied.text, replied.sender.clone())
            .await?;
    }
    Ok(())
}
