//! Infrastructure for Moosebot: configuration loading, filesystem
//! session storage, the provider HTTP clients, and the Telegram gateway.

pub mod auth;
pub mod config;
pub mod gateway;
pub mod provider;
pub mod session;
