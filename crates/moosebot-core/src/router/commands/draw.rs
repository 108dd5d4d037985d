//! `draw ...` -- run the image generation workflow and narrate it.
//!
//! Progress edits a single placeholder message; only the final image is
//! sent fresh. `draw this` draws the replied-to message's text, joined
//! with any remainder of the prompt.

use std::future::Future;
use std::pin::Pin;

use futures_util::{pin_mut, StreamExt};

use moosebot_types::chat::AspectRatio;
use moosebot_types::error::HandlerError;
use moosebot_types::gateway::MediaPayload;
use moosebot_types::provider::DrawEvent;

use crate::imagegen::run_draw_workflow;
use crate::router::text::{failure_message, strip_prefix_ci, trim_separators};
use crate::router::{Command, CommandContext, Outcome};

pub struct DrawCommand;

impl Command for DrawCommand {
    fn name(&self) -> &'static str {
        "draw"
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome, HandlerError>> + Send + 'a>> {
        Box::pin(async move {
            if strip_prefix_ci(ctx.prompt(), "draw").is_none() {
                return Ok(Outcome::NotHandled);
            }

            ctx.gateway.send_typing(ctx.conversation()).await?;

            let prompt = match resolve_prompt(ctx) {
                Some(prompt) => prompt,
                None => {
                    ctx.gateway
                        .send_text(ctx.conversation(), "What exactly should I draw?")
                        .await?;
                    return Ok(Outcome::Handled);
                }
            };

            let (aspect, sanitized) = AspectRatio::extract(&prompt);
            let placeholder = ctx
                .gateway
                .send_text(ctx.conversation(), "Drawing that now!")
                .await?;

            let workflow = run_draw_workflow(
                ctx.images.clone(),
                sanitized.clone(),
                aspect,
                rand::random(),
                ctx.image_poll_interval,
            );
            pin_mut!(workflow);

            while let Some(event) = workflow.next().await {
                match event {
                    DrawEvent::Progress { attempt } => {
                        ctx.gateway
                            .edit_text(&placeholder, &format!("Drawing {attempt}"))
                            .await?;
                    }
                    DrawEvent::Done { image: Some(bytes) } => {
                        ctx.gateway.delete_message(&placeholder).await?;
                        ctx.gateway
                            .send_media(
                                ctx.conversation(),
                                MediaPayload::Photo {
                                    bytes,
                                    caption: Some(sanitized.clone()),
                                },
                            )
                            .await?;
                        ctx.session
                            .add_user_context(&sanitized, ctx.inbound.sender.clone())
                            .await?;
                    }
                    DrawEvent::Done { image: None } => {
                        ctx.gateway
                            .edit_text(
                                &placeholder,
                                &failure_message(Some("the result held no image")),
                            )
                            .await?;
                    }
                    DrawEvent::Failed { reason } => {
                        ctx.gateway
                            .edit_text(&placeholder, &failure_message(Some(&reason)))
                            .await?;
                    }
                }
            }
            Ok(Outcome::Handled)
        })
    }
}

/// What to draw: the prompt itself, or for `draw this` the replied-to
/// text joined with the remainder. `None` means there is nothing to
/// draw and the user should be asked.
fn resolve_prompt(ctx: &CommandContext) -> Option<String> {
    let rest = match strip_prefix_ci(ctx.prompt(), "draw this") {
        // "draw thistles" is a plain draw, not a draw-this.
        Some(rest) if rest.is_empty() || rest.starts_with(|c: char| !c.is_alphanumeric()) => rest,
        _ => return Some(ctx.prompt().to_string()),
    };

    let replied_text = ctx
        .inbound
        .replied_to
        .as_ref()
        .map(|replied| replied.text.trim())
        .filter(|text| !text.is_empty())?;

    let remainder = trim_separators(rest);
    if remainder.is_empty() {
        Some(replied_text.to_string())
    } else {
        Some(format!("{replied_text}, {remainder}"))
    }
}
