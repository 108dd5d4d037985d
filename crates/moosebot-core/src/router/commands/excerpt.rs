//! `excerpt` -- on-demand conversation summary.
//!
//! Plain `excerpt` answers with a one-off summary; `excerpt apply`
//! additionally replaces the whole history with it.

use std::future::Future;
use std::pin::Pin;

use moosebot_types::error::HandlerError;

use crate::router::text::{strip_prefix_ci, trim_separators};
use crate::router::{Command, CommandContext, Outcome};

pub struct ExcerptCommand;

impl Command for ExcerptCommand {
    fn name(&self) -> &'static str {
        "excerpt"
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome, HandlerError>> + Send + 'a>> {
        Box::pin(async move {
            let Some(rest) = strip_prefix_ci(ctx.prompt(), "excerpt") else {
                return Ok(Outcome::NotHandled);
            };
            if !rest.is_empty() && !rest.starts_with(|c: char| !c.is_alphanumeric()) {
                return Ok(Outcome::NotHandled);
            }

            let apply = trim_separators(rest).eq_ignore_ascii_case("apply");
            ctx.gateway.send_typing(ctx.conversation()).await?;
            let summary = ctx.session.excerpt(apply).await?;
            ctx.gateway.send_text(ctx.conversation(), &summary).await?;
            Ok(Outcome::Handled)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context_for, MemoryRepo, RecordingGateway, ScriptedChat, ScriptedImages};
    use moosebot_types::chat::ConversationId;
    use moosebot_types::gateway::InboundMessage;

    async fn ctx_with_history(prompt: &str) -> (CommandContext, RecordingGateway) {
        let gateway = RecordingGateway::new();
        let chat = ScriptedChat::new();
        chat.push_reply("an answer", None);
        chat.push_reply("the summary", None);
        let ctx = context_for(
            InboundMessage::text(ConversationId::new("chat1"), prompt),
            MemoryRepo::new(),
            chat,
            gateway.clone(),
            ScriptedImages::new(),
        )
        .await;
        ctx.session.query("earlier turn", None).await.unwrap();
        (ctx, gateway)
    }

    #[tokio::test]
    async fn plain_excerpt_summarizes_without_touching_history() {
        let (ctx, gateway) = ctx_with_history("excerpt").await;

        let outcome = ExcerptCommand.execute(&ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(gateway.texts(), vec!["the summary".to_string()]);
        assert_eq!(ctx.session.history_len().await, 2);
    }

    #[tokio::test]
    async fn excerpt_apply_compacts_history() {
        let (ctx, gateway) = ctx_with_history("excerpt apply").await;

        ExcerptCommand.execute(&ctx).await.unwrap();
        assert_eq!(gateway.texts(), vec!["the summary".to_string()]);
        assert_eq!(ctx.session.history_len().await, 1);
    }

    #[tokio::test]
    async fn longer_word_is_not_an_excerpt_command() {
        let (ctx, _gateway) = ctx_with_history("excerpted notes please").await;
        let outcome = ExcerptCommand.execute(&ctx).await.unwrap();
        assert_eq!(outcome, Outcome::NotHandled);
    }
}
