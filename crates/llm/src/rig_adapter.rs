use confab_chat::{Role, StreamTarget};
use futures::StreamExt;
use rig::completion::{CompletionModel, Message as RigMessage};
use rig::prelude::CompletionClient;
use rig::providers::openai;
use rig::streaming::StreamedAssistantContent;
use snafu::{ResultExt, ensure};
use tokio::sync::{mpsc, oneshot};

use super::provider::{
    ChatProvider, CompletionsFailedSnafu, EmptyMessageSetSnafu, HttpClientSnafu,
    MissingApiKeySnafu, ProviderConfig, ProviderError, ProviderMessage, ProviderResult,
    ProviderStreamHandle, ProviderWorker, SnapshotAccumulator, StreamEvent, StreamPayload,
    StreamRequest, make_event_stream,
};

pub const RIG_OPENAI_PROVIDER_ID: &str = "openai";

type RigStreamingResponse = rig::streaming::StreamingCompletionResponse<
    rig::providers::openai::responses_api::streaming::StreamingCompletionResponse,
>;

/// OpenAI-compatible chat completions through rig.
pub struct RigProvider {
    config: ProviderConfig,
}

impl RigProvider {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        ensure!(
            !config.api_key.is_empty(),
            MissingApiKeySnafu {
                stage: "rig-provider-new",
                provider_id: config.provider_id.clone(),
            }
        );

        Ok(Self { config })
    }

    fn build_client(config: &ProviderConfig) -> ProviderResult<openai::Client> {
        let mut builder = openai::Client::builder().api_key(config.api_key.as_str());
        if !config.endpoint.is_empty() {
            builder = builder.base_url(config.endpoint.as_str());
        }
        builder.build().context(HttpClientSnafu {
            stage: "build-client",
        })
    }

    fn to_rig_message(message: &ProviderMessage) -> Option<RigMessage> {
        if message.content.trim().is_empty() {
            return None;
        }
        Some(match message.role {
            Role::User => RigMessage::user(message.content.clone()),
            Role::Assistant => RigMessage::assistant(message.content.clone()),
        })
    }

    async fn open_stream(
        config: &ProviderConfig,
        request: &StreamRequest,
    ) -> ProviderResult<RigStreamingResponse> {
        let client = Self::build_client(config)?;
        let model = client.completion_model(request.model_id.clone());

        let mut messages = request
            .messages
            .iter()
            .filter_map(Self::to_rig_message)
            .collect::<Vec<_>>();

        let Some(prompt) = messages.pop() else {
            tracing::warn!(
                target = ?request.target,
                model_id = %request.model_id,
                total_message_count = request.messages.len(),
                "cannot open stream because every message is blank"
            );
            return EmptyMessageSetSnafu {
                stage: "open-stream-pop-prompt",
                target: request.target,
            }
            .fail();
        };
        let mut builder = model.completion_request(prompt).messages(messages);

        if let Some(preamble) = request
            .preamble
            .as_ref()
            .filter(|preamble| !preamble.trim().is_empty())
        {
            builder = builder.preamble(preamble.clone());
        }

        if let Some(temperature) = request.temperature {
            builder = builder.temperature(temperature);
        }

        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        builder.stream().await.context(CompletionsFailedSnafu {
            stage: "open-stream",
        })
    }

    fn emit_error_event(
        event_tx: &mpsc::UnboundedSender<StreamEvent>,
        target: StreamTarget,
        error: ProviderError,
    ) {
        let _ = event_tx.send(StreamEvent {
            target,
            payload: StreamPayload::Error(error.to_string()),
        });
    }

    /// Turns a rig chunk into the next snapshot. Only visible reply text counts;
    /// reasoning and tool traffic never reach the transcript.
    fn map_stream_item<R>(
        target: StreamTarget,
        accumulator: &mut SnapshotAccumulator,
        item: StreamedAssistantContent<R>,
    ) -> Option<StreamEvent>
    where
        R: Clone + Unpin,
    {
        let snapshot = match item {
            StreamedAssistantContent::Text(text) => accumulator.push(&text.text)?,
            StreamedAssistantContent::Reasoning(_)
            | StreamedAssistantContent::ReasoningDelta { .. }
            | StreamedAssistantContent::ToolCall { .. }
            | StreamedAssistantContent::ToolCallDelta { .. }
            | StreamedAssistantContent::Final(_) => return None,
        };

        Some(StreamEvent {
            target,
            payload: StreamPayload::Snapshot(snapshot),
        })
    }

    async fn run_stream_worker(
        config: ProviderConfig,
        request: StreamRequest,
        event_tx: mpsc::UnboundedSender<StreamEvent>,
        mut cancel_rx: oneshot::Receiver<()>,
    ) {
        let target = request.target;
        let mut stream = match Self::open_stream(&config, &request).await {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!(
                    target = ?target,
                    provider_id = %config.provider_id,
                    model_id = %request.model_id,
                    error = %error,
                    "failed to open provider stream"
                );
                Self::emit_error_event(&event_tx, target, error);
                return;
            }
        };

        let mut accumulator = SnapshotAccumulator::new();
        let mut cancelled = false;
        let mut stream_failed = false;

        loop {
            tokio::select! {
                _ = &mut cancel_rx => {
                    cancelled = true;
                    tracing::debug!(target = ?target, "provider stream cancelled");
                    stream.cancel();
                    break;
                }
                next_item = stream.next() => {
                    match next_item {
                        Some(Ok(item)) => {
                            if let Some(event) = Self::map_stream_item(target, &mut accumulator, item)
                                && event_tx.send(event).is_err()
                            {
                                return;
                            }
                        }
                        Some(Err(source)) => {
                            stream_failed = true;
                            tracing::warn!(
                                target = ?target,
                                error = %source,
                                "provider stream emitted an error chunk"
                            );
                            let error = ProviderError::CompletionsFailed {
                                stage: "stream-chunk",
                                source,
                            };
                            Self::emit_error_event(&event_tx, target, error);
                            break;
                        }
                        None => break,
                    }
                }
            }
        }

        if !cancelled && !stream_failed {
            tracing::debug!(
                target = ?target,
                content_len = accumulator.content().len(),
                "provider stream finished"
            );
            let _ = event_tx.send(StreamEvent {
                target,
                payload: StreamPayload::Done,
            });
        }
    }
}

impl ChatProvider for RigProvider {
    fn id(&self) -> &str {
        &self.config.provider_id
    }

    fn name(&self) -> &str {
        "Rig OpenAI"
    }

    fn stream_chat(&self, request: StreamRequest) -> ProviderResult<ProviderStreamHandle> {
        ensure!(
            !request.messages.is_empty(),
            EmptyMessageSetSnafu {
                stage: "stream-chat",
                target: request.target,
            }
        );

        let (event_tx, stream, cancel_rx) = make_event_stream(request.target);
        let worker: ProviderWorker = Box::pin(Self::run_stream_worker(
            self.config.clone(),
            request,
            event_tx,
            cancel_rx,
        ));

        Ok(ProviderStreamHandle { stream, worker })
    }
}

#[cfg(test)]
mod tests {
    use confab_chat::GenerationId;

    use super::*;

    #[test]
    fn requires_an_api_key() {
        let error = RigProvider::new(ProviderConfig::new("openai", "  ", ""))
            .err()
            .unwrap();
        assert!(matches!(error, ProviderError::MissingApiKey { .. }));
    }

    #[test]
    fn rejects_empty_requests_before_spawning() {
        let provider = RigProvider::new(ProviderConfig::new("openai", "sk-test", "")).unwrap();
        let request = StreamRequest::new(StreamTarget::new(GenerationId::new(1)), "gpt", vec![]);

        let error = provider.stream_chat(request).err().unwrap();
        assert!(matches!(error, ProviderError::EmptyMessageSet { .. }));
    }

    #[test]
    fn blank_turns_are_not_forwarded() {
        assert!(RigProvider::to_rig_message(&ProviderMessage::new(Role::Assistant, " ")).is_none());
        assert!(RigProvider::to_rig_message(&ProviderMessage::new(Role::User, "hi")).is_some());
    }
}
