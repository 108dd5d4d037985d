//! Shared domain types for Moosebot.
//!
//! Pure data shapes and error taxonomies, no I/O. Everything else in the
//! workspace depends on this crate.

pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod provider;
