//! `look[,] <text>` -- answer a question about an attached or replied-to
//! photo via the vision backend.
//!
//! The photo travels to the backend as a URL (the gateway downscales
//! and hosts it); only the derived answer text joins history.

use std::future::Future;
use std::pin::Pin;

use moosebot_types::error::HandlerError;
use moosebot_types::gateway::PhotoRef;

use crate::router::commands::add_replied_context;
use crate::router::text::{failure_message, strip_prefix_ci};
use crate::router::{Command, CommandContext, Outcome};

pub struct LookCommand;

impl Command for LookCommand {
    fn name(&self) -> &'static str {
        "look"
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome, HandlerError>> + Send + 'a>> {
        Box::pin(async move {
            let Some(rest) = strip_prefix_ci(ctx.prompt(), "look") else {
                return Ok(Outcome::NotHandled);
            };
            if !rest.is_empty() && !rest.starts_with(|c: char| c == ',' || c.is_whitespace()) {
                return Ok(Outcome::NotHandled);
            }

            ctx.gateway.send_typing(ctx.conversation()).await?;
            add_replied_context(ctx).await?;
            let placeholder = ctx
                .gateway
                .send_text(ctx.conversation(), "Taking a look!")
                .await?;

            let answer = match find_photo(ctx) {
                // A vision failure edits the placeholder in place, like
                // the draw command, instead of leaving it dangling next
                // to a separate failure text.
                Some(photo) => match describe_photo(ctx, &photo).await {
                    Ok(answer) => answer,
                    Err(e) => failure_message(Some(&e.to_string())),
                },
                None => nothing_to_look_at(),
            };
            ctx.gateway.edit_text(&placeholder, &answer).await?;
            Ok(Outcome::Handled)
        })
    }
}

async fn describe_photo(
    ctx: &CommandContext,
    photo: &PhotoRef,
) -> Result<String, HandlerError> {
    let url = ctx.gateway.photo_url(photo).await?;
    Ok(ctx.session.query_with_image(ctx.prompt(), &url).await?)
}

/// A photo on the message itself wins over one on the replied-to message.
fn find_photo(ctx: &CommandContext) -> Option<PhotoRef> {
    ctx.inbound.photo.clone().or_else(|| {
        ctx.inbound
            .replied_to
            .as_ref()
            .and_then(|replied| replied.photo.clone())
    })
}

fn nothing_to_look_at() -> String {
    let emoji = if rand::random::<bool>() {
        '\u{1F9D0}'
    } else {
        '\u{1F914}'
    };
    format!("Nothing to look at {emoji}?")
}
