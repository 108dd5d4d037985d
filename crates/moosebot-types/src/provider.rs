//! Provider-facing data shapes.
//!
//! The shapes are identical across providers; only endpoint values differ.
//! Wire-format details live in moosebot-infra; the core consumes these.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a completion call: the answer text plus usage when the
/// provider reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<crate::chat::UsageSnapshot>,
}

/// Structured moderation result, passed through to the user verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub flagged: bool,
    pub categories: BTreeMap<String, bool>,
    pub category_scores: BTreeMap<String, f64>,
}

/// Opaque provider-issued identifier for an in-flight image generation
/// request. Lives only for the duration of one draw workflow; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJobHandle(String);

impl ImageJobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageJobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a single image-generation probe.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePoll {
    /// Generation still running.
    Pending,
    /// Generation finished. An absent payload means the provider produced
    /// no output; callers treat that like a failure to find the image,
    /// not a transport error.
    Done { image: Option<Vec<u8>> },
}

/// Event emitted by the image generation workflow.
///
/// A workflow emits zero or more `Progress` events terminated by exactly
/// one of `Done` or `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    /// Still running; `attempt` counts probes starting at 1.
    Progress { attempt: u32 },
    Done { image: Option<Vec<u8>> },
    Failed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderation_verdict_serde_roundtrip() {
        let json = r#"{
            "flagged": true,
            "categories": { "violence": true, "hate": false },
            "category_scores": { "violence": 0.91, "hate": 0.01 }
        }"#;
        let verdict: ModerationVerdict = serde_json::from_str(json).unwrap();
        assert!(verdict.flagged);
        assert_eq!(verdict.categories["violence"], true);

        let back = serde_json::to_value(&verdict).unwrap();
        assert_eq!(back["category_scores"]["violence"], 0.91);
    }

    #[test]
    fn image_job_handle_display() {
        let handle = ImageJobHandle::new("op-123");
        assert_eq!(handle.to_string(), "op-123");
        assert_eq!(handle.as_str(), "op-123");
    }
}
