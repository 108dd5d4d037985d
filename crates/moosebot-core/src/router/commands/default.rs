//! The conversational default -- always last, always handles.
//!
//! Feeds the replied-to context plus the prompt to the completion
//! backend and replies with the answer. A `speak`-prefixed prompt turns
//! the answer into synthesized speech instead of text.

use std::future::Future;
use std::pin::Pin;

use moosebot_types::error::HandlerError;
use moosebot_types::gateway::MediaPayload;

use crate::router::commands::add_replied_context;
use crate::router::text::strip_prefix_ci;
use crate::router::{Command, CommandContext, Outcome};

pub struct DefaultCommand;

impl Command for DefaultCommand {
    fn name(&self) -> &'static str {
        "default"
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome, HandlerError>> + Send + 'a>> {
        Box::pin(async move {
            ctx.gateway.send_typing(ctx.conversation()).await?;
            add_replied_context(ctx).await?;

            let answer = ctx
                .session
                .query(ctx.prompt(), ctx.inbound.sender.clone())
                .await?;

            if strip_prefix_ci(ctx.prompt(), "speak").is_some() {
                ctx.gateway.send_typing(ctx.conversation()).await?;
                let audio = ctx.speech.speak(&answer).await?;
                ctx.gateway
                    .send_media(ctx.conversation(), MediaPayload::Voice { bytes: audio })
                    .await?;
            } else {
                ctx.gateway.send_text(ctx.conversation(), &answer).await?;
            }
            Ok(Outcome::Handled)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        context_for, GatewayCall, MemoryRepo, RecordingGateway, ScriptedChat,
        ScriptedImages,
    };
    use moosebot_types::chat::ConversationId;
    use moosebot_types::gateway::{InboundMessage, RepliedMessage};

    async fn ctx_with(
        inbound: InboundMessage,
        chat: ScriptedChat,
    ) -> (CommandContext, RecordingGateway) {
        let gateway = RecordingGateway::new();
        let ctx = context_for(
            inbound,
            MemoryRepo::new(),
            chat,
            gateway.clone(),
            ScriptedImages::new(),
        )
        .await;
        (ctx, gateway)
    }

    #[tokio::test]
    async fn answer_goes_back_as_text_and_both_turns_join_history() {
        let chat = ScriptedChat::new();
        chat.push_reply("nice to meet you", Some((8, 5)));
        let mut inbound = InboundMessage::text(ConversationId::new("chat1"), "hello");
        inbound.sender = Some("alice".to_string());
        let (ctx, gateway) = ctx_with(inbound, chat).await;

        let outcome = DefaultCommand.execute(&ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(gateway.texts(), vec!["nice to meet you".to_string()]);
        assert_eq!(ctx.session.history_len().await, 2);
        assert_eq!(ctx.session.usage().await.unwrap().prompt_tokens, 8);
    }

    #[tokio::test]
    async fn speak_prefix_turns_the_answer_into_voice() {
        let chat = ScriptedChat::new();
        chat.push_reply("once upon a time", None);
        let inbound =
            InboundMessage::text(ConversationId::new("chat1"), "speak a bedtime story");
        let (ctx, gateway) = ctx_with(inbound, chat).await;

        DefaultCommand.execute(&ctx).await.unwrap();
        let calls = gateway.calls();
        assert!(calls.contains(&GatewayCall::Voice));
        assert!(gateway.texts().is_empty());
        // The spoken answer still lands in history as text.
        assert_eq!(ctx.session.history_len().await, 2);
    }

    #[tokio::test]
    async fn replied_context_precedes_the_turn() {
        let chat = ScriptedChat::new();
        chat.push_reply("I agree", None);
        let mut inbound =
            InboundMessage::text(ConversationId::new("chat1"), "what do you think");
        inbound.replied_to = Some(RepliedMessage {
            text: "moose are majestic".to_string(),
            sender: Some("bob".to_string()),
            photo: None,
        });
        let (ctx, _gateway) = ctx_with(inbound, chat).await;

        DefaultCommand.execute(&ctx).await.unwrap();
        // Replied context, user turn, assistant turn.
        assert_eq!(ctx.session.history_len().await, 3);
    }
}
