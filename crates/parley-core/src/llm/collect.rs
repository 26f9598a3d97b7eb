//! Drain a provider stream into a single reply.
//!
//! Fragments are concatenated in delivery order. The whole drain shares one
//! deadline, and the caller's `CancellationToken` aborts it between events.
//! Anything short of a terminal `Done` event is a failure: the reply is only
//! usable when the provider said it was finished.

use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use parley_types::llm::{LlmError, StopReason, StreamEvent, Usage};

use super::provider::LlmStream;

/// Everything gathered from one completed stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedReply {
    pub text: String,
    pub stop_reason: Option<StopReason>,
    pub usage: Option<Usage>,
}

/// Consume `stream` until `Done`, a stream error, the deadline, or cancellation.
pub async fn collect_reply(
    mut stream: LlmStream,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<CollectedReply, LlmError> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut reply = CollectedReply::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            next = tokio::time::timeout_at(deadline, stream.next()) => next,
        };

        let event = match next {
            Err(_) => return Err(LlmError::Timeout(timeout)),
            Ok(None) => return Err(LlmError::IncompleteStream),
            Ok(Some(result)) => result?,
        };

        match event {
            StreamEvent::Connected => {}
            StreamEvent::TextDelta { text } => reply.text.push_str(&text),
            StreamEvent::MessageDelta { stop_reason } => reply.stop_reason = Some(stop_reason),
            StreamEvent::Usage(usage) => reply.usage = Some(usage),
            StreamEvent::Done => return Ok(reply),
        }
    }
}
