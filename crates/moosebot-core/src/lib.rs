//! Conversation-state and command-routing engine.
//!
//! The core of the bot: session store and per-conversation sessions,
//! the ordered intent router and its command set, the image generation
//! workflow, the credential refresher, and the excerpt scheduler.
//!
//! All I/O happens behind capability traits ([`provider`]); the
//! implementations live in moosebot-infra.

pub mod credentials;
pub mod excerpt;
pub mod imagegen;
pub mod provider;
pub mod router;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
