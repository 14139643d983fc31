use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use confab_chat::markdown::{self, Block, MarkdownStyle};
use confab_chat::{ChangeTracker, ChatSession, Message, MessageId, Role};
use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, Icon, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex, v_flex,
};

use crate::chat::events::{ErrorDismissed, RetryRequested};
use crate::chat::message::{render_avatar, render_message};
use crate::chat::scroll_manager::ScrollManager;

pub const COMPOSING_LABEL: &str = "AI is thinking...";

struct CachedBlocks {
    content: String,
    blocks: Rc<[Block]>,
}

/// Parsed markdown per assistant message, re-parsed only when its content changes.
#[derive(Default)]
pub struct MarkdownCache {
    entries: HashMap<MessageId, CachedBlocks>,
}

impl MarkdownCache {
    pub fn blocks_for(&mut self, message: &Message) -> Rc<[Block]> {
        if let Some(entry) = self.entries.get(&message.id)
            && entry.content == message.content
        {
            return entry.blocks.clone();
        }

        let blocks: Rc<[Block]> = markdown::parse(&message.content).into();
        self.entries.insert(
            message.id,
            CachedBlocks {
                content: message.content.clone(),
                blocks: blocks.clone(),
            },
        );
        blocks
    }

    /// Drops entries for messages no longer in the transcript.
    pub fn retain(&mut self, messages: &[Message]) {
        let active_ids = messages
            .iter()
            .map(|message| message.id)
            .collect::<HashSet<_>>();
        self.entries.retain(|id, _| active_ids.contains(id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct MessageList {
    messages: Vec<Message>,
    composing: bool,
    error: Option<SharedString>,
    change_tracker: ChangeTracker,
    scroll_manager: ScrollManager,
    markdown_cache: MarkdownCache,
    style: MarkdownStyle,
}

impl EventEmitter<RetryRequested> for MessageList {}
impl EventEmitter<ErrorDismissed> for MessageList {}

impl MessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            messages: Vec::new(),
            composing: false,
            error: None,
            change_tracker: ChangeTracker::new(),
            scroll_manager: ScrollManager::new(),
            markdown_cache: MarkdownCache::default(),
            style: MarkdownStyle::default(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Mirrors the session. Scrolling only follows transcript revisions, so
    /// phase or feedback flips never move the view.
    pub fn sync(&mut self, session: &ChatSession, cx: &mut Context<Self>) {
        let revision = session.transcript().revision();
        if self.change_tracker.observe(revision) {
            self.messages = session.messages().to_vec();
            self.markdown_cache.retain(&self.messages);
            if self.messages.is_empty() {
                self.scroll_manager.reset();
            } else {
                self.scroll_manager.request_scroll_to_bottom();
            }
        }

        self.composing = session.shows_composing_indicator();
        self.error = session.error().map(|message| SharedString::from(message.to_string()));
        cx.notify();
    }

    fn render_composing(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .id("composing-indicator")
            .w_full()
            .items_center()
            .gap_3()
            .child(render_avatar(Role::Assistant, cx))
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .px_4()
                    .py_2()
                    .rounded_lg()
                    .bg(theme.secondary)
                    .child(
                        Icon::new(IconName::LoaderCircle)
                            .small()
                            .text_color(theme.muted_foreground),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child(COMPOSING_LABEL),
                    ),
            )
    }

    fn render_error(&self, error: SharedString, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("error-panel")
            .w_full()
            .gap_2()
            .p_3()
            .rounded_lg()
            .border_1()
            .border_color(theme.danger)
            .bg(theme.danger.opacity(0.08))
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .text_color(theme.danger)
                    .child(Icon::new(IconName::TriangleAlert).small())
                    .child(div().text_sm().font_weight(FontWeight::SEMIBOLD).child("Error")),
            )
            .child(div().text_sm().child(error))
            .child(
                h_flex()
                    .gap_2()
                    .child(
                        Button::new("error-retry")
                            .small()
                            .outline()
                            .label("Retry")
                            .on_click(cx.listener(|_, _, _window, cx| {
                                cx.emit(RetryRequested);
                            })),
                    )
                    .child(
                        Button::new("error-dismiss")
                            .small()
                            .ghost()
                            .label("Dismiss")
                            .on_click(cx.listener(|_, _, _window, cx| {
                                cx.emit(ErrorDismissed);
                            })),
                    ),
            )
    }
}

impl Render for MessageList {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if self.scroll_manager.apply_pending_scroll() {
            window.request_animation_frame();
        }

        let rows = self
            .messages
            .iter()
            .map(|message| {
                let blocks = match message.role {
                    Role::Assistant => self.markdown_cache.blocks_for(message),
                    Role::User => Rc::from([]),
                };
                render_message(message, &blocks, &self.style, cx)
            })
            .collect::<Vec<_>>();

        v_flex()
            .id("message-list")
            .size_full()
            .min_h_0()
            .px_4()
            .py_3()
            .gap_4()
            .overflow_y_scroll()
            .track_scroll(self.scroll_manager.handle())
            .children(rows)
            .when(self.composing, |list| list.child(self.render_composing(cx)))
            .when_some(self.error.clone(), |list, error| {
                list.child(self.render_error(error, cx))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_is_reparsed_only_on_content_change() {
        let mut cache = MarkdownCache::default();
        let mut message = Message::assistant(MessageId::new(1), "# Title");

        let first = cache.blocks_for(&message);
        let second = cache.blocks_for(&message);
        assert!(Rc::ptr_eq(&first, &second));

        message.content.push_str("\n\nbody");
        let third = cache.blocks_for(&message);
        assert!(!Rc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 2);
    }

    #[test]
    fn retain_drops_cleared_messages() {
        let mut cache = MarkdownCache::default();
        let kept = Message::assistant(MessageId::new(1), "kept");
        let dropped = Message::assistant(MessageId::new(2), "dropped");
        cache.blocks_for(&kept);
        cache.blocks_for(&dropped);

        cache.retain(std::slice::from_ref(&kept));
        assert_eq!(cache.len(), 1);

        cache.retain(&[]);
        assert!(cache.is_empty());
    }
}
