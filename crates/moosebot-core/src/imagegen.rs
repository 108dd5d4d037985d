//! The submit-then-poll image generation workflow.
//!
//! The workflow is a lazy event stream: nothing is submitted until the
//! consumer starts pulling. Every terminal outcome (done, rejected,
//! poll failure) ends the stream; progress events carry a 1-based
//! attempt counter so the consumer can narrate the wait.

use std::time::Duration;

use async_stream::stream;
use futures_util::Stream;
use tracing::debug;

use moosebot_types::chat::AspectRatio;
use moosebot_types::provider::{DrawEvent, ImagePoll};

use crate::provider::BoxImageBackend;

/// Drive one generation job to completion, yielding [`DrawEvent`]s.
///
/// The first poll happens one `poll_interval` after submission.
pub fn run_draw_workflow(
    images: std::sync::Arc<BoxImageBackend>,
    prompt: String,
    aspect: AspectRatio,
    seed: u64,
    poll_interval: Duration,
) -> impl Stream<Item = DrawEvent> {
    stream! {
        let handle = match images.submit(&prompt, &aspect, seed).await {
            Ok(handle) => handle,
            Err(e) => {
                yield DrawEvent::Failed { reason: e.to_string() };
                return;
            }
        };
        debug!(job = %handle, "generation submitted");

        let mut attempt: u32 = 0;
        loop {
            tokio::time::sleep(poll_interval).await;
            match images.poll(&handle).await {
                Ok(ImagePoll::Pending) => {
                    attempt += 1;
                    yield DrawEvent::Progress { attempt };
                }
                Ok(ImagePoll::Done { image }) => {
                    yield DrawEvent::Done { image };
                    return;
                }
                Err(e) => {
                    yield DrawEvent::Failed { reason: e.to_string() };
                    return;
                }
            }
        }
    }
}
