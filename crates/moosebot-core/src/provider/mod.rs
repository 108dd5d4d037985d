//! Capability traits for the external collaborators.
//!
//! One trait per capability, identical shape across providers. All traits
//! use native async fn in traits (RPITIT, Rust 2024 edition); the
//! [`boxed`] module provides object-safe wrappers for dynamic dispatch.

pub mod backend;
pub mod boxed;

pub use backend::{ChatBackend, ImageBackend, MessagingGateway, ModerationBackend, SpeechBackend};
pub use boxed::{BoxChatBackend, BoxGateway, BoxImageBackend, BoxModerationBackend, BoxSpeechBackend};
