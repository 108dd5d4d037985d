//! `role` -- inspect or replace the session's system role.
//!
//! `set role <text>` replaces and echoes; a bare `set role` asks what to
//! set. Any `<word> role ...` prompt ("what role do you have") answers
//! with the current role.

use std::future::Future;
use std::pin::Pin;

use moosebot_types::error::HandlerError;

use crate::router::text::{strip_prefix_ci, trim_separators};
use crate::router::{Command, CommandContext, Outcome};

pub struct RoleCommand;

impl Command for RoleCommand {
    fn name(&self) -> &'static str {
        "role"
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome, HandlerError>> + Send + 'a>> {
        Box::pin(async move {
            let prompt = ctx.prompt();

            if let Some(rest) = strip_prefix_ci(prompt, "set role") {
                let role = trim_separators(rest);
                if role.is_empty() {
                    ctx.gateway
                        .send_text(ctx.conversation(), "Which role should I set?")
                        .await?;
                } else {
                    ctx.session.set_role(role).await?;
                    ctx.gateway.send_text(ctx.conversation(), role).await?;
                }
                return Ok(Outcome::Handled);
            }

            if asks_for_role(prompt) {
                let role = ctx.session.role().await;
                ctx.gateway.send_text(ctx.conversation(), &role).await?;
                return Ok(Outcome::Handled);
            }

            Ok(Outcome::NotHandled)
        })
    }
}

/// `<word> role ...` -- the second word starts with "role".
fn asks_for_role(prompt: &str) -> bool {
    let mut words = prompt.split_whitespace();
    match (words.next(), words.next()) {
        (Some(first), Some(second)) => {
            first.chars().all(|c| c.is_alphanumeric())
                && second.to_lowercase().starts_with("role")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::simple_context;

    #[tokio::test]
    async fn set_role_replaces_and_echoes() {
        let (ctx, gateway) = simple_context("set role: you are a pirate").await;

        let outcome = RoleCommand.execute(&ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(ctx.session.role().await, "you are a pirate");
        assert_eq!(gateway.texts(), vec!["you are a pirate".to_string()]);
    }

    #[tokio::test]
    async fn bare_set_role_asks_which() {
        let (ctx, gateway) = simple_context("set role").await;

        RoleCommand.execute(&ctx).await.unwrap();
        assert_eq!(ctx.session.role().await, "default role");
        assert_eq!(gateway.texts(), vec!["Which role should I set?".to_string()]);
    }

    #[tokio::test]
    async fn asking_for_the_role_replies_it_without_mutation() {
        let (ctx, gateway) = simple_context("what role?").await;

        let outcome = RoleCommand.execute(&ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(gateway.texts(), vec!["default role".to_string()]);
        assert_eq!(ctx.session.history_len().await, 0);
        assert!(ctx.session.usage().await.is_none());
    }

    #[tokio::test]
    async fn role_mentioned_later_is_not_a_command() {
        let (ctx, _gateway) = simple_context("tell me about the role of bees").await;
        // Second word is "me", not "role".
        let outcome = RoleCommand.execute(&ctx).await.unwrap();
        assert_eq!(outcome, Outcome::NotHandled);
    }
}
