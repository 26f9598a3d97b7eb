//! OpenAI SSE stream to [`StreamEvent`] adapter.
//!
//! Maps `async-openai`'s [`ChatCompletionResponseStream`] to the
//! provider-agnostic [`StreamEvent`] enum defined in `parley-types`.
//!
//! `Done` is only emitted once a chunk carried a finish reason. A transport
//! that closes before that ends the stream with `IncompleteStream` instead,
//! so a truncated reply is never mistaken for a finished one.

use futures_util::StreamExt;

use async_openai::types::chat::ChatCompletionResponseStream;

use parley_core::llm::provider::LlmStream;
use parley_types::llm::{LlmError, StreamEvent, Usage};

use super::map_finish_reason;

/// Map an async-openai [`ChatCompletionResponseStream`] to a stream of [`StreamEvent`]s.
///
/// The returned stream emits events in this order:
/// 1. `Connected` -- immediately on entry
/// 2. `TextDelta` -- for each non-empty text chunk
/// 3. `MessageDelta` -- with the stop reason when finish_reason appears
/// 4. `Usage` -- token usage (requires `stream_options.include_usage = true`)
/// 5. `Done` -- at the end of a finished stream
pub fn map_openai_stream(stream: ChatCompletionResponseStream) -> LlmStream {
    Box::pin(async_stream::try_stream! {
        yield StreamEvent::Connected;

        let mut finished = false;
        let mut stream = stream;

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(|e| LlmError::Stream(e.to_string()))?;

            // The final chunk carries usage with an empty choices array
            let usage = chunk.usage.as_ref().map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            });
            if let Some(usage) = usage {
                yield StreamEvent::Usage(usage);
            }

            for choice in chunk.choices {
                if let Some(text) = choice.delta.content {
                    if !text.is_empty() {
                        yield StreamEvent::TextDelta { text };
                    }
                }

                if let Some(finish_reason) = choice.finish_reason {
                    finished = true;
                    yield StreamEvent::MessageDelta {
                        stop_reason: map_finish_reason(&finish_reason),
                    };
                }
            }
        }

        if !finished {
            Err::<(), LlmError>(LlmError::IncompleteStream)?;
        }

        yield StreamEvent::Done;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_openai::error::OpenAIError;
    use async_openai::types::chat::CreateChatCompletionStreamResponse;
    use parley_types::llm::StopReason;
    use serde_json::{Value, json};

    fn chunk(choices: Value, usage: Option<Value>) -> CreateChatCompletionStreamResponse {
        serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 1,
            "model": "gemini-1.5-flash",
            "choices": choices,
            "usage": usage,
        }))
        .unwrap()
    }

    fn text_chunk(text: &str) -> CreateChatCompletionStreamResponse {
        chunk(
            json!([{ "index": 0, "delta": { "content": text }, "finish_reason": null }]),
            None,
        )
    }

    fn finish_chunk(reason: &str) -> CreateChatCompletionStreamResponse {
        chunk(
            json!([{ "index": 0, "delta": {}, "finish_reason": reason }]),
            None,
        )
    }

    async fn collect(
        items: Vec<Result<CreateChatCompletionStreamResponse, OpenAIError>>,
    ) -> Vec<Result<StreamEvent, LlmError>> {
        let source: ChatCompletionResponseStream = Box::pin(futures_util::stream::iter(items));
        map_openai_stream(source).collect().await
    }

    #[tokio::test]
    async fn test_finished_stream_ends_with_done() {
        let events = collect(vec![
            Ok(text_chunk("Hel")),
            Ok(text_chunk("lo")),
            Ok(finish_chunk("stop")),
        ])
        .await;

        let events: Vec<StreamEvent> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(
            events,
            vec![
                StreamEvent::Connected,
                StreamEvent::TextDelta { text: "Hel".into() },
                StreamEvent::TextDelta { text: "lo".into() },
                StreamEvent::MessageDelta {
                    stop_reason: StopReason::EndTurn
                },
                StreamEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_truncated_stream_reports_incomplete() {
        let events = collect(vec![Ok(text_chunk("Hel"))]).await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Ok(StreamEvent::Connected)));
        assert!(matches!(&events[1], Ok(StreamEvent::TextDelta { text }) if text == "Hel"));
        assert!(matches!(events[2], Err(LlmError::IncompleteStream)));
    }

    #[tokio::test]
    async fn test_empty_stream_reports_incomplete() {
        let events = collect(Vec::new()).await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(StreamEvent::Connected)));
        assert!(matches!(events[1], Err(LlmError::IncompleteStream)));
    }

    #[tokio::test]
    async fn test_trailing_usage_chunk_is_reported_before_done() {
        let usage = chunk(
            json!([]),
            Some(json!({ "prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15 })),
        );
        let events = collect(vec![Ok(text_chunk("Hi")), Ok(finish_chunk("length")), Ok(usage)]).await;

        let events: Vec<StreamEvent> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(
            events[2..],
            [
                StreamEvent::MessageDelta {
                    stop_reason: StopReason::MaxTokens
                },
                StreamEvent::Usage(Usage {
                    input_tokens: 12,
                    output_tokens: 3,
                }),
                StreamEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_content_is_skipped() {
        let events = collect(vec![Ok(text_chunk("")), Ok(finish_chunk("stop"))]).await;

        assert!(events.iter().all(|e| !matches!(e, Ok(StreamEvent::TextDelta { .. }))));
        assert!(matches!(events.last(), Some(Ok(StreamEvent::Done))));
    }

    #[tokio::test]
    async fn test_transport_error_maps_to_stream_error() {
        let events = collect(vec![
            Ok(text_chunk("Hel")),
            Err(OpenAIError::InvalidArgument("connection reset".into())),
            Ok(finish_chunk("stop")),
        ])
        .await;

        assert_eq!(events.len(), 3);
        match &events[2] {
            Err(LlmError::Stream(message)) => assert!(message.contains("connection reset")),
            other => panic!("expected stream error, got {other:?}"),
        }
    }
}
