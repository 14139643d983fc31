use std::time::Duration;

use confab_chat::StreamTarget;
use tokio::sync::{mpsc, oneshot};

use super::provider::{
    ChatProvider, EmptyMessageSetSnafu, ProviderResult, ProviderStreamHandle, ProviderWorker,
    SnapshotAccumulator, StreamEvent, StreamPayload, StreamRequest, make_event_stream,
};

pub const ECHO_PROVIDER_ID: &str = "echo";
pub const DEFAULT_WORD_DELAY: Duration = Duration::from_millis(40);

/// Offline provider that streams the last user message back word by word.
pub struct EchoProvider {
    word_delay: Duration,
}

impl Default for EchoProvider {
    fn default() -> Self {
        Self::new(DEFAULT_WORD_DELAY)
    }
}

impl EchoProvider {
    pub fn new(word_delay: Duration) -> Self {
        Self { word_delay }
    }

    /// Splits text into chunks that keep their trailing whitespace, so the
    /// concatenation of all chunks is the original text.
    fn chunks(text: &str) -> Vec<&str> {
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut in_whitespace = false;

        for (index, ch) in text.char_indices() {
            if ch.is_whitespace() {
                in_whitespace = true;
            } else if in_whitespace {
                chunks.push(&text[start..index]);
                start = index;
                in_whitespace = false;
            }
        }
        if start < text.len() {
            chunks.push(&text[start..]);
        }
        chunks
    }

    async fn run_stream_worker(
        reply: String,
        word_delay: Duration,
        target: StreamTarget,
        event_tx: mpsc::UnboundedSender<StreamEvent>,
        mut cancel_rx: oneshot::Receiver<()>,
    ) {
        let mut accumulator = SnapshotAccumulator::new();

        for chunk in Self::chunks(&reply) {
            tokio::select! {
                _ = &mut cancel_rx => {
                    tracing::debug!(target = ?target, "echo stream cancelled");
                    return;
                }
                _ = tokio::time::sleep(word_delay) => {}
            }

            if let Some(snapshot) = accumulator.push(chunk)
                && event_tx
                    .send(StreamEvent {
                        target,
                        payload: StreamPayload::Snapshot(snapshot),
                    })
                    .is_err()
            {
                return;
            }
        }

        let _ = event_tx.send(StreamEvent {
            target,
            payload: StreamPayload::Done,
        });
    }
}

impl ChatProvider for EchoProvider {
    fn id(&self) -> &str {
        ECHO_PROVIDER_ID
    }

    fn name(&self) -> &str {
        "Echo"
    }

    fn stream_chat(&self, request: StreamRequest) -> ProviderResult<ProviderStreamHandle> {
        let Some(reply) = request
            .last_user_message()
            .map(|message| message.content.clone())
        else {
            return EmptyMessageSetSnafu {
                stage: "echo-stream-chat",
                target: request.target,
            }
            .fail();
        };

        let (event_tx, stream, cancel_rx) = make_event_stream(request.target);
        let worker: ProviderWorker = Box::pin(Self::run_stream_worker(
            reply,
            self.word_delay,
            request.target,
            event_tx,
            cancel_rx,
        ));

        Ok(ProviderStreamHandle { stream, worker })
    }
}

#[cfg(test)]
mod tests {
    use confab_chat::{GenerationId, Role};

    use super::*;
    use crate::provider::{ProviderError, ProviderMessage};

    fn request(messages: Vec<ProviderMessage>) -> StreamRequest {
        StreamRequest::new(StreamTarget::new(GenerationId::new(3)), "echo", messages)
    }

    #[test]
    fn chunks_concatenate_back_to_the_input() {
        let text = "  Hello  big\nworld ";
        let chunks = EchoProvider::chunks(text);
        assert_eq!(chunks, vec!["  ", "Hello  ", "big\n", "world "]);
        assert_eq!(chunks.concat(), text);
    }

    #[tokio::test]
    async fn streams_growing_snapshots_then_done() {
        let provider = EchoProvider::new(Duration::ZERO);
        let handle = provider
            .stream_chat(request(vec![ProviderMessage::new(Role::User, "one two")]))
            .unwrap();
        let mut stream = handle.stream;
        tokio::spawn(handle.worker);

        let mut payloads = Vec::new();
        while let Some(event) = stream.recv().await {
            assert_eq!(event.target, stream.target());
            payloads.push(event.payload);
        }

        assert_eq!(
            payloads,
            vec![
                StreamPayload::Snapshot("one ".to_string()),
                StreamPayload::Snapshot("one two".to_string()),
                StreamPayload::Done,
            ]
        );
    }

    #[tokio::test]
    async fn cancel_stops_without_done() {
        let provider = EchoProvider::new(Duration::from_secs(60));
        let handle = provider
            .stream_chat(request(vec![ProviderMessage::new(Role::User, "never sent")]))
            .unwrap();
        let mut stream = handle.stream;
        let worker = tokio::spawn(handle.worker);

        assert!(stream.cancel());
        worker.await.unwrap();
        assert_eq!(stream.recv().await, None);
    }

    #[test]
    fn requires_a_user_turn() {
        let error = EchoProvider::default()
            .stream_chat(request(vec![ProviderMessage::new(Role::Assistant, "hi")]))
            .err()
            .unwrap();
        assert!(matches!(error, ProviderError::EmptyMessageSet { .. }));
    }
}
