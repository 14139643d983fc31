use std::sync::Arc;

use confab_chat::ChatConfig;
use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::notification::{Notification, NotificationList};
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex, v_flex,
};

use crate::chat::ChatView;

pub const APP_TITLE: &str = "AI Chat Assistant";

#[cfg(target_os = "macos")]
const WINDOW_TOOLBAR_LEFT_SAFE_PADDING: f32 = 78.0;
#[cfg(not(target_os = "macos"))]
const WINDOW_TOOLBAR_LEFT_SAFE_PADDING: f32 = 16.0;
#[cfg(target_os = "windows")]
const WINDOW_TOOLBAR_RIGHT_SAFE_PADDING: f32 = 120.0;
#[cfg(not(target_os = "windows"))]
const WINDOW_TOOLBAR_RIGHT_SAFE_PADDING: f32 = 16.0;

/// Computes the top toolbar height using a Zed-style responsive formula.
fn window_toolbar_height(window: &Window) -> Pixels {
    (1.75 * window.rem_size()).max(px(34.0))
}

gpui::actions!(shell, [Quit, ClearChat, CopyChat, ExportChat]);

/// Main window shell: title bar with transcript actions above the chat view.
pub struct ChatAppShell {
    notification_list: Entity<NotificationList>,
    chat_view: Entity<ChatView>,
    title_bar_should_move: bool,
}

impl ChatAppShell {
    pub fn new(
        config: Arc<ChatConfig>,
        notification_list: Entity<NotificationList>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let chat_view = cx.new(|cx| ChatView::new(config, window, cx));

        // Header buttons depend on transcript state owned by the chat view.
        cx.observe(&chat_view, |_, _, cx| cx.notify()).detach();

        Self {
            notification_list,
            chat_view,
            title_bar_should_move: false,
        }
    }

    fn notify_user(&self, notification: Notification, window: &mut Window, cx: &mut App) {
        self.notification_list.update(cx, |list, cx| {
            list.push(notification, window, cx);
        });
    }

    fn clear_chat(&mut self, _: &ClearChat, _window: &mut Window, cx: &mut Context<Self>) {
        self.chat_view
            .update(cx, |chat_view, cx| chat_view.clear_chat(cx));
    }

    fn copy_chat(&mut self, _: &CopyChat, window: &mut Window, cx: &mut Context<Self>) {
        let result = self
            .chat_view
            .update(cx, |chat_view, cx| chat_view.copy_chat(cx));

        match result {
            Ok(()) => {
                self.notify_user(Notification::success("Chat copied to clipboard"), window, cx);
            }
            Err(error) => {
                tracing::warn!(error = %error, "copy chat failed");
                self.notify_user(
                    Notification::error(format!("Failed to copy chat: {error}")),
                    window,
                    cx,
                );
            }
        }
    }

    fn export_chat(&mut self, _: &ExportChat, window: &mut Window, cx: &mut Context<Self>) {
        let result = self
            .chat_view
            .update(cx, |chat_view, cx| chat_view.export_chat(cx));

        match result {
            Ok(path) => {
                tracing::info!(path = %path.display(), "chat exported");
                self.notify_user(
                    Notification::success(format!("Chat exported to {}", path.display())),
                    window,
                    cx,
                );
            }
            Err(error) => {
                tracing::warn!(error = %error, "export chat failed");
                self.notify_user(
                    Notification::error(format!("Failed to export chat: {error}")),
                    window,
                    cx,
                );
            }
        }
    }

    fn render_transcript_actions(&self, cx: &Context<Self>) -> impl IntoElement {
        let (has_messages, copied) = {
            let chat_view = self.chat_view.read(cx);
            (chat_view.has_messages(), chat_view.copy_feedback_active())
        };
        let copy_icon = if copied {
            IconName::Check
        } else {
            IconName::Copy
        };

        h_flex()
            .id("transcript-actions")
            .gap_1()
            .items_center()
            .when(has_messages, |actions| {
                actions
                    .child(
                        Button::new("copy-chat")
                            .ghost()
                            .small()
                            .icon(copy_icon)
                            .tooltip("Copy chat")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.copy_chat(&CopyChat, window, cx);
                            })),
                    )
                    .child(
                        Button::new("export-chat")
                            .ghost()
                            .small()
                            .icon(IconName::ArrowDown)
                            .tooltip("Export chat")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.export_chat(&ExportChat, window, cx);
                            })),
                    )
                    .child(
                        Button::new("clear-chat")
                            .ghost()
                            .small()
                            .icon(IconName::Delete)
                            .tooltip("Clear chat")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.clear_chat(&ClearChat, window, cx);
                            })),
                    )
            })
    }

    fn render_top_bar(
        &self,
        window: &Window,
        toolbar_height: Pixels,
        cx: &Context<Self>,
    ) -> impl IntoElement {
        let theme = cx.theme();
        let provider_label = self.chat_view.read(cx).provider_label();

        h_flex()
            .id("app-top-bar")
            .window_control_area(WindowControlArea::Drag)
            .on_mouse_down_out(cx.listener(|this, _, _window, _cx| {
                this.title_bar_should_move = false;
            }))
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, _, _window, _cx| {
                    this.title_bar_should_move = false;
                }),
            )
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, _, _window, _cx| {
                    this.title_bar_should_move = true;
                }),
            )
            .on_mouse_move(cx.listener(|this, _, window, _cx| {
                if this.title_bar_should_move {
                    this.title_bar_should_move = false;
                    window.start_window_move();
                }
            }))
            .w_full()
            .h(toolbar_height)
            .flex_shrink_0()
            .pl(px(WINDOW_TOOLBAR_LEFT_SAFE_PADDING))
            .pr(px(WINDOW_TOOLBAR_RIGHT_SAFE_PADDING))
            .items_center()
            .justify_between()
            .bg(theme.background)
            .border_b_1()
            .border_color(theme.border)
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .child(
                        div()
                            .text_sm()
                            .font_weight(FontWeight::SEMIBOLD)
                            .child(APP_TITLE),
                    )
                    .child(
                        div()
                            .id("app-provider-label")
                            .px_2()
                            .py_1()
                            .rounded_full()
                            .bg(theme.muted)
                            .border_1()
                            .border_color(theme.border)
                            .text_xs()
                            .text_color(theme.muted_foreground)
                            .child(provider_label),
                    ),
            )
            .when(
                cfg!(target_os = "linux") && window.window_controls().window_menu,
                |title_bar| {
                    title_bar.on_mouse_down(MouseButton::Right, |event, window, _| {
                        window.show_window_menu(event.position);
                    })
                },
            )
            .child(
                h_flex()
                    .items_center()
                    // Keep button clicks from starting a window drag.
                    .on_mouse_down(MouseButton::Left, |_, _, cx| cx.stop_propagation())
                    .child(self.render_transcript_actions(cx))
                    .child(self.render_linux_window_controls(window, cx)),
            )
    }

    fn render_linux_window_controls(&self, window: &Window, cx: &Context<Self>) -> AnyElement {
        #[cfg(target_os = "linux")]
        {
            let maximize_icon = if window.is_maximized() {
                IconName::WindowRestore
            } else {
                IconName::WindowMaximize
            };

            h_flex()
                .id("linux-window-controls")
                .items_center()
                // Double-clicks on the controls must not reach the title bar zoom gesture.
                .on_mouse_down(MouseButton::Right, |_, _, cx| cx.stop_propagation())
                .gap_2()
                .ml_2()
                .child(
                    Button::new("linux-window-minimize")
                        .ghost()
                        .small()
                        .icon(IconName::WindowMinimize)
                        .on_click(cx.listener(|_, _, window, _| {
                            window.minimize_window();
                        })),
                )
                .child(
                    Button::new("linux-window-maximize")
                        .ghost()
                        .small()
                        .icon(maximize_icon)
                        .on_click(cx.listener(|_, _, window, _| {
                            window.zoom_window();
                        })),
                )
                .child(
                    Button::new("linux-window-close")
                        .ghost()
                        .small()
                        .icon(IconName::WindowClose)
                        .on_click(cx.listener(|_, _, window, _| {
                            window.remove_window();
                        })),
                )
                .into_any_element()
        }

        #[cfg(not(target_os = "linux"))]
        {
            let _ = (window, cx);
            div().into_any_element()
        }
    }
}

impl Render for ChatAppShell {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let toolbar_height = window_toolbar_height(window);

        div()
            .id("app-shell")
            .key_context("ChatAppShell")
            .on_action(cx.listener(Self::clear_chat))
            .on_action(cx.listener(Self::copy_chat))
            .on_action(cx.listener(Self::export_chat))
            .size_full()
            .relative()
            .bg(theme.background)
            .child(
                v_flex()
                    .size_full()
                    .child(self.render_top_bar(window, toolbar_height, cx))
                    .child(
                        div()
                            .id("main-content")
                            .flex_1()
                            .w_full()
                            .min_h_0()
                            .overflow_hidden()
                            .child(self.chat_view.clone()),
                    ),
            )
            .child(self.notification_list.clone())
    }
}
