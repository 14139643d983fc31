use std::ops::Range;

use confab_chat::markdown::{Block, Inline, MarkdownStyle};
use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::{ActiveTheme, h_flex, v_flex};

/// Inline decoration applied to a byte range of a flattened run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Code,
    Emphasis,
    Strong,
    Strikethrough,
    Link,
}

/// A paragraph's inlines joined into one string plus the styled ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedInlines {
    pub text: String,
    pub spans: Vec<(Range<usize>, SpanKind)>,
}

pub fn flatten_inlines(inlines: &[Inline]) -> FlattenedInlines {
    let mut flattened = FlattenedInlines::default();

    for inline in inlines {
        let kind = match inline {
            Inline::Text(_) | Inline::LineBreak => None,
            Inline::Code(_) => Some(SpanKind::Code),
            Inline::Emphasis(_) => Some(SpanKind::Emphasis),
            Inline::Strong(_) => Some(SpanKind::Strong),
            Inline::Strikethrough(_) => Some(SpanKind::Strikethrough),
            Inline::Link { .. } => Some(SpanKind::Link),
        };

        let start = flattened.text.len();
        flattened.text.push_str(inline.plain_text());
        let end = flattened.text.len();

        if let Some(kind) = kind
            && end > start
        {
            flattened.spans.push((start..end, kind));
        }
    }

    flattened
}

fn highlight_for(kind: SpanKind, cx: &App) -> HighlightStyle {
    let theme = cx.theme();
    match kind {
        SpanKind::Code => HighlightStyle {
            background_color: Some(theme.muted),
            color: Some(theme.foreground),
            ..Default::default()
        },
        SpanKind::Emphasis => HighlightStyle {
            font_style: Some(FontStyle::Italic),
            ..Default::default()
        },
        SpanKind::Strong => HighlightStyle {
            font_weight: Some(FontWeight::BOLD),
            ..Default::default()
        },
        SpanKind::Strikethrough => HighlightStyle {
            strikethrough: Some(StrikethroughStyle {
                thickness: px(1.),
                color: None,
            }),
            ..Default::default()
        },
        SpanKind::Link => HighlightStyle {
            color: Some(theme.primary),
            underline: Some(UnderlineStyle {
                thickness: px(1.),
                color: None,
                wavy: false,
            }),
            ..Default::default()
        },
    }
}

fn render_inlines(inlines: &[Inline], cx: &App) -> AnyElement {
    let flattened = flatten_inlines(inlines);
    let highlights = flattened
        .spans
        .into_iter()
        .map(|(range, kind)| (range, highlight_for(kind, cx)))
        .collect::<Vec<_>>();

    StyledText::new(flattened.text)
        .with_highlights(highlights)
        .into_any_element()
}

pub fn render_blocks(blocks: &[Block], style: &MarkdownStyle, cx: &App) -> Vec<AnyElement> {
    blocks
        .iter()
        .map(|block| render_block(block, style, cx))
        .collect()
}

fn render_block(block: &Block, style: &MarkdownStyle, cx: &App) -> AnyElement {
    let theme = cx.theme();

    match block {
        Block::Paragraph(inlines) => div()
            .w_full()
            .child(render_inlines(inlines, cx))
            .into_any_element(),
        Block::Heading { level, inlines } => div()
            .w_full()
            .text_size(rems(style.heading_scale(*level)))
            .font_weight(FontWeight::SEMIBOLD)
            .child(render_inlines(inlines, cx))
            .into_any_element(),
        Block::List { start, items } => v_flex()
            .w_full()
            .gap(px(style.item_gap))
            .pl(px(style.list_indent))
            .children(items.iter().enumerate().map(|(index, item)| {
                let marker = match start {
                    Some(first) => format!("{}.", first + index as u64),
                    None => "•".to_string(),
                };
                h_flex()
                    .w_full()
                    .items_start()
                    .gap_2()
                    .child(div().flex_shrink_0().child(marker))
                    .child(
                        v_flex()
                            .flex_1()
                            .min_w_0()
                            .gap(px(style.item_gap))
                            .children(render_blocks(item, style, cx)),
                    )
            }))
            .into_any_element(),
        Block::BlockQuote(blocks) => v_flex()
            .w_full()
            .gap(px(style.block_gap))
            .map(|quote| {
                if style.quote_border_width >= 2.0 {
                    quote.border_l_2()
                } else {
                    quote.border_l_1()
                }
            })
            .border_color(theme.border)
            .pl(px(style.quote_padding))
            .text_color(theme.muted_foreground)
            .italic()
            .children(render_blocks(blocks, style, cx))
            .into_any_element(),
        Block::CodeBlock { language, code } => v_flex()
            .w_full()
            .gap_1()
            .p(px(style.code_block_padding))
            .rounded_md()
            .bg(theme.muted)
            .when_some(language.clone(), |column, language| {
                column.child(
                    div()
                        .text_xs()
                        .text_color(theme.muted_foreground)
                        .child(language),
                )
            })
            .child(
                div()
                    .w_full()
                    .overflow_hidden()
                    .font_family(theme.mono_font_family.clone())
                    .text_size(rems(style.code_scale))
                    .child(code.clone()),
            )
            .into_any_element(),
        Block::Rule => div().w_full().h(px(1.)).bg(theme.border).into_any_element(),
    }
}
