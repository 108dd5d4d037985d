//! Messaging gateway transports.

mod telegram;

pub use telegram::TelegramGateway;
