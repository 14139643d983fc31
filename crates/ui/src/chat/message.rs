use confab_chat::markdown::{Block, MarkdownStyle};
use confab_chat::{Message, MessageId, Role};
use gpui::*;
use gpui_component::{ActiveTheme, Icon, IconName, h_flex, v_flex};

use crate::chat::markdown_view::render_blocks;

const BUBBLE_MAX_WIDTH: Pixels = px(560.);
const AVATAR_SIZE: Pixels = px(28.);

/// Element id for a transcript row; the full 64-bit id is kept.
pub fn message_element_id(id: MessageId) -> ElementId {
    ElementId::Name(SharedString::from(format!("message-{}", id.0)))
}

pub fn render_avatar(role: Role, cx: &App) -> impl IntoElement {
    let theme = cx.theme();
    let (icon, background, foreground) = match role {
        Role::User => (IconName::User, theme.primary, theme.primary_foreground),
        Role::Assistant => (IconName::Bot, theme.muted, theme.foreground),
    };

    div()
        .size(AVATAR_SIZE)
        .flex_shrink_0()
        .rounded_full()
        .flex()
        .items_center()
        .justify_center()
        .bg(background)
        .child(Icon::new(icon).size(px(16.)).text_color(foreground))
}

/// Renders one transcript entry.
///
/// User turns are shown verbatim, right-aligned. Assistant turns go through the
/// markdown blocks parsed for them.
pub fn render_message(
    message: &Message,
    blocks: &[Block],
    style: &MarkdownStyle,
    cx: &App,
) -> AnyElement {
    let theme = cx.theme();

    match message.role {
        Role::User => h_flex()
            .id(message_element_id(message.id))
            .w_full()
            .justify_end()
            .items_start()
            .gap_3()
            .child(
                div()
                    .max_w(BUBBLE_MAX_WIDTH)
                    .px_4()
                    .py_2()
                    .rounded_lg()
                    .bg(theme.primary)
                    .text_color(theme.primary_foreground)
                    .text_sm()
                    .child(message.content.clone()),
            )
            .child(render_avatar(Role::User, cx))
            .into_any_element(),
        Role::Assistant => h_flex()
            .id(message_element_id(message.id))
            .w_full()
            .justify_start()
            .items_start()
            .gap_3()
            .child(render_avatar(Role::Assistant, cx))
            .child(
                v_flex()
                    .max_w(BUBBLE_MAX_WIDTH)
                    .min_w_0()
                    .gap(px(style.block_gap))
                    .px_4()
                    .py_2()
                    .rounded_lg()
                    .bg(theme.secondary)
                    .text_color(theme.secondary_foreground)
                    .text_sm()
                    .children(render_blocks(blocks, style, cx)),
            )
            .into_any_element(),
    }
}
