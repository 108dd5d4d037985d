//! Ordered intent routing.
//!
//! The router evaluates a fixed list of commands against the inbound
//! prompt, strictly in list order, and stops at the first one that
//! reports the message handled. Order is a contract: later patterns are
//! intentionally broader and rely on earlier, narrower patterns being
//! checked first. The conversational default sits last and always
//! handles.

pub mod commands;
mod text;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use moosebot_types::chat::ConversationId;
use moosebot_types::error::HandlerError;
use moosebot_types::gateway::InboundMessage;

use crate::provider::{
    BoxGateway, BoxImageBackend, BoxModerationBackend, BoxSpeechBackend,
};
use crate::session::ChatSession;

pub use text::{failure_message, strip_mention};

/// Whether a command recognized and consumed the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    NotHandled,
}

/// Everything a command handler can reach: the resolved session, the
/// outbound gateway, the capability backends, and the inbound message.
pub struct CommandContext {
    pub session: Arc<ChatSession>,
    pub gateway: Arc<BoxGateway>,
    pub speech: Arc<BoxSpeechBackend>,
    pub moderation: Arc<BoxModerationBackend>,
    pub images: Arc<BoxImageBackend>,
    pub inbound: InboundMessage,
    /// Probe interval for draw workflows started by this dispatch.
    pub image_poll_interval: Duration,
}

impl CommandContext {
    pub fn conversation(&self) -> &ConversationId {
        &self.inbound.conversation
    }

    /// The normalized prompt (mention already stripped by the caller).
    pub fn prompt(&self) -> &str {
        &self.inbound.text
    }
}

/// One (predicate, handler) pair. The predicate lives inside `execute`:
/// a command that does not recognize the prompt returns `NotHandled`
/// without side effects.
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;

    fn execute<'a>(
        &'a self,
        ctx: &'a CommandContext,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome, HandlerError>> + Send + 'a>>;
}

/// The ordered command list.
pub struct Router {
    commands: Vec<Box<dyn Command>>,
}

impl Router {
    /// The full command set, narrow patterns before broad ones, the
    /// conversational default last.
    pub fn with_default_commands() -> Self {
        Self {
            commands: vec![
                Box::new(commands::status::StatusCommand),
                Box::new(commands::excerpt::ExcerptCommand),
                Box::new(commands::role::RoleCommand),
                Box::new(commands::moderation::ModerationCommand),
                Box::new(commands::look::LookCommand),
                Box::new(commands::draw::DrawCommand),
                Box::new(commands::default::DefaultCommand),
            ],
        }
    }

    #[cfg(test)]
    fn from_commands(commands: Vec<Box<dyn Command>>) -> Self {
        Self { commands }
    }

    /// Dispatch one inbound message.
    ///
    /// A handler failure is converted here into a single user-visible
    /// failure reply and never rethrown; session state is left as the
    /// handler found it.
    pub async fn dispatch(&self, ctx: &CommandContext) {
        for command in &self.commands {
            match command.execute(ctx).await {
                Ok(Outcome::NotHandled) => continue,
                Ok(Outcome::Handled) => {
                    debug!(
                        conversation = %ctx.conversation(),
                        command = command.name(),
                        "handled"
                    );
                    return;
                }
                Err(e) => {
                    warn!(
                        conversation = %ctx.conversation(),
                        command = command.name(),
                        error = %e,
                        "handler failed"
                    );
                    let notice = failure_message(Some(&e.to_string()));
                    if let Err(send_err) =
                        ctx.gateway.send_text(ctx.conversation(), &notice).await
                    {
                        warn!(
                            conversation = %ctx.conversation(),
                            error = %send_err,
                            "failure notice undeliverable"
                        );
                    }
                    return;
                }
            }
        }
    }
}
