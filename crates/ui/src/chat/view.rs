use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use confab_chat::error::ExportResult;
use confab_chat::{
    COPY_FEEDBACK_DURATION, ChatConfig, ChatSession, Clipboard, ClipboardError, DirectoryExport,
    Generation, StreamTarget,
};
use confab_llm::{
    ChatProvider, ProviderConfig, ProviderEventStream, ProviderMessage, ProviderStreamHandle,
    ProviderWorker, StreamEvent, StreamPayload, StreamRequest, create_provider,
};
use gpui::*;
use gpui_component::{ActiveTheme, IconName, Icon, v_flex};
use gpui_tokio_bridge::Tokio;

use crate::chat::events::{ErrorDismissed, PromptSelected, RetryRequested, Stop, Submit};
use crate::chat::{MessageInput, MessageList, PromptSuggestions};

/// Platform clipboard behind the session's clipboard seam.
struct AppClipboard<'a> {
    cx: &'a mut App,
}

impl Clipboard for AppClipboard<'_> {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.cx
            .write_to_clipboard(ClipboardItem::new_string(text.to_string()));
        Ok(())
    }
}

/// Transcript controller: owns the session and wires input, list and provider.
pub struct ChatView {
    session: ChatSession,
    config: Arc<ChatConfig>,
    provider: Option<Arc<dyn ChatProvider>>,
    provider_error: Option<String>,
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    suggestions: Entity<PromptSuggestions>,
    stream_worker_task: Option<Task<Result<(), gpui_tokio_bridge::JoinError>>>,
    stream_reader_task: Option<Task<()>>,
    copy_feedback_task: Option<Task<()>>,
}

impl ChatView {
    pub fn new(config: Arc<ChatConfig>, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(window, cx));
        let suggestions = cx.new(PromptSuggestions::new);

        cx.subscribe(&message_input, |this, _, event: &Submit, cx| {
            this.handle_submit(&event.content, cx);
        })
        .detach();

        cx.subscribe(&message_input, |this, _, _event: &Stop, cx| {
            this.stop(cx);
        })
        .detach();

        cx.subscribe_in(
            &suggestions,
            window,
            |this, _, event: &PromptSelected, window, cx| {
                this.select_prompt(event.prompt, window, cx);
            },
        )
        .detach();

        cx.subscribe(&message_list, |this, _, _event: &RetryRequested, cx| {
            this.retry(cx);
        })
        .detach();

        cx.subscribe(&message_list, |this, _, _event: &ErrorDismissed, cx| {
            this.dismiss_error(cx);
        })
        .detach();

        let (provider, provider_error) = Self::initialize_provider(&config);

        Self {
            session: ChatSession::new(),
            config,
            provider,
            provider_error,
            message_list,
            message_input,
            suggestions,
            stream_worker_task: None,
            stream_reader_task: None,
            copy_feedback_task: None,
        }
    }

    fn initialize_provider(config: &ChatConfig) -> (Option<Arc<dyn ChatProvider>>, Option<String>) {
        let provider_config =
            ProviderConfig::new(&config.provider_id, &config.api_key, &config.endpoint);

        match create_provider(provider_config) {
            Ok(provider) => {
                tracing::info!(
                    provider_id = %provider.id(),
                    model_id = %config.model,
                    "chat provider ready"
                );
                (Some(provider), None)
            }
            Err(error) => {
                tracing::warn!(
                    provider_id = %config.provider_id,
                    error = %error,
                    "chat provider unavailable"
                );
                (None, Some(error.to_string()))
            }
        }
    }

    pub fn has_messages(&self) -> bool {
        !self.session.transcript().is_empty()
    }

    pub fn copy_feedback_active(&self) -> bool {
        self.session.copy_feedback_active()
    }

    pub fn provider_label(&self) -> String {
        match &self.provider {
            Some(provider) => format!("{} · {}", provider.name(), self.config.model),
            None => "No provider".to_string(),
        }
    }

    fn handle_submit(&mut self, content: &str, cx: &mut Context<Self>) {
        match self.session.submit(content) {
            Ok(generation) => self.start_generation(generation, cx),
            Err(rejected) => {
                tracing::debug!(?rejected, "submit ignored");
            }
        }
    }

    fn start_generation(&mut self, generation: Generation, cx: &mut Context<Self>) {
        let target = generation.target;
        self.sync_views(cx);

        let Some(provider) = self.provider.clone() else {
            let message = match &self.provider_error {
                Some(error) => format!("Provider configuration error: {error}"),
                None => "Provider is not configured.".to_string(),
            };
            self.session.fail(target, message);
            self.sync_views(cx);
            return;
        };

        let messages = generation
            .history
            .iter()
            .map(ProviderMessage::from)
            .collect::<Vec<_>>();
        let mut request = StreamRequest::new(target, self.config.model.clone(), messages);
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(system_prompt) = &self.config.system_prompt {
            request = request.with_preamble(system_prompt.clone());
        }

        match provider.stream_chat(request) {
            Ok(handle) => self.spawn_stream_pipeline(handle, cx),
            Err(error) => {
                tracing::warn!(generation = ?target, error = %error, "failed to start generation");
                self.session.fail(target, error.to_string());
                self.sync_views(cx);
            }
        }
    }

    fn spawn_stream_pipeline(&mut self, handle: ProviderStreamHandle, cx: &mut Context<Self>) {
        self.spawn_stream_worker(handle.worker, cx);
        self.spawn_stream_reader(handle.stream, cx);
    }

    fn spawn_stream_worker(&mut self, worker: ProviderWorker, cx: &mut Context<Self>) {
        self.stream_worker_task = Some(Tokio::spawn(cx, worker));
    }

    fn spawn_stream_reader(&mut self, mut stream: ProviderEventStream, cx: &mut Context<Self>) {
        let stream_target = stream.target();

        self.stream_reader_task = Some(cx.spawn(async move |this, cx| {
            while let Some(event) = stream.recv().await {
                let _ = this.update(cx, |this, cx| {
                    this.handle_stream_event(event, cx);
                });
            }

            let _ = this.update(cx, |this, cx| {
                this.handle_stream_reader_closed(stream_target, cx);
            });
        }));
    }

    fn handle_stream_event(&mut self, event: StreamEvent, cx: &mut Context<Self>) {
        let applied = match event.payload {
            StreamPayload::Snapshot(content) => self.session.apply_snapshot(event.target, content),
            StreamPayload::Done => self.session.complete(event.target),
            StreamPayload::Error(message) => {
                tracing::warn!(generation = ?event.target, error = %message, "generation failed");
                self.session.fail(event.target, message)
            }
        };

        if applied {
            self.sync_views(cx);
        }
    }

    fn handle_stream_reader_closed(&mut self, target: StreamTarget, cx: &mut Context<Self>) {
        self.stream_worker_task = None;
        self.stream_reader_task = None;

        if self.session.phase().active_target() == Some(target) {
            self.session
                .fail(target, "provider stream ended before a terminal event");
            self.sync_views(cx);
        }
    }

    /// Dropping the reader drops the event stream, which cancels the worker.
    fn cancel_stream_tasks(&mut self) {
        self.stream_reader_task = None;
        self.stream_worker_task = None;
    }

    pub fn stop(&mut self, cx: &mut Context<Self>) {
        if let Some(target) = self.session.stop() {
            tracing::debug!(generation = ?target, "generation stopped by user");
            self.cancel_stream_tasks();
            self.sync_views(cx);
        }
    }

    pub fn retry(&mut self, cx: &mut Context<Self>) {
        self.cancel_stream_tasks();
        if let Some(generation) = self.session.retry() {
            self.start_generation(generation, cx);
        }
    }

    pub fn dismiss_error(&mut self, cx: &mut Context<Self>) {
        if self.session.dismiss_error() {
            self.sync_views(cx);
        }
    }

    pub fn clear_chat(&mut self, cx: &mut Context<Self>) {
        if let Some(target) = self.session.clear_chat() {
            tracing::debug!(generation = ?target, "generation cancelled by clear");
        }
        self.cancel_stream_tasks();
        self.sync_views(cx);
    }

    pub fn copy_chat(&mut self, cx: &mut Context<Self>) -> Result<(), ClipboardError> {
        let ticket = self.session.copy_chat(&mut AppClipboard { cx })?;

        // Replacing the task drops the previous timer, so the newest copy owns the reset.
        self.copy_feedback_task = Some(cx.spawn(async move |this, cx| {
            cx.background_executor().timer(COPY_FEEDBACK_DURATION).await;
            let _ = this.update(cx, |this, cx| {
                if this.session.expire_copy_feedback(ticket) {
                    cx.notify();
                }
            });
        }));

        cx.notify();
        Ok(())
    }

    pub fn export_chat(&mut self, _cx: &mut Context<Self>) -> ExportResult<PathBuf> {
        let target = DirectoryExport::new(self.config.export_directory());
        self.session.export_chat(&target, Utc::now())
    }

    pub fn select_prompt(&mut self, prompt: &str, window: &mut Window, cx: &mut Context<Self>) {
        self.message_input.update(cx, |input, cx| {
            input.set_draft(prompt, window, cx);
        });
    }

    fn sync_views(&mut self, cx: &mut Context<Self>) {
        let loading = self.session.is_loading();
        self.message_list.update(cx, |list, cx| {
            list.sync(&self.session, cx);
        });
        self.message_input.update(cx, |input, cx| {
            input.set_loading(loading, cx);
        });
        cx.notify();
    }

    fn render_welcome(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("welcome-panel")
            .flex_1()
            .min_h_0()
            .w_full()
            .items_center()
            .justify_center()
            .gap_6()
            .p_6()
            .child(
                v_flex()
                    .items_center()
                    .gap_2()
                    .child(
                        Icon::new(IconName::Bot)
                            .size(px(40.))
                            .text_color(theme.muted_foreground),
                    )
                    .child(
                        div()
                            .text_xl()
                            .font_weight(FontWeight::SEMIBOLD)
                            .child("Welcome to AI Chat"),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child("Start a conversation or try one of the suggestions below"),
                    ),
            )
            .child(div().w_full().max_w(px(640.)).child(self.suggestions.clone()))
            .children(self.provider_error.as_ref().map(|error| {
                div()
                    .text_xs()
                    .text_color(theme.warning)
                    .child(format!("Provider unavailable: {error}"))
            }))
    }
}

impl Render for ChatView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let body = if self.has_messages() {
            div()
                .id("chat-view-message-list")
                .flex_1()
                .min_h_0()
                .child(self.message_list.clone())
                .into_any_element()
        } else {
            self.render_welcome(cx).into_any_element()
        };

        v_flex()
            .id("chat-view")
            .relative()
            .size_full()
            .min_h_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(body)
            .child(
                div()
                    .id("chat-view-message-input")
                    .flex_shrink_0()
                    .w_full()
                    .border_t_1()
                    .border_color(theme.border)
                    .child(self.message_input.clone()),
            )
    }
}
