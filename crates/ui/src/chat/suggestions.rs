use confab_chat::{PromptSuggestion, SUGGESTIONS};
use gpui::*;
use gpui_component::{ActiveTheme, h_flex, v_flex};

use crate::chat::events::PromptSelected;

const COLUMNS: usize = 2;

/// Grid of starter prompts. Picking one only reports its text.
pub struct PromptSuggestions {
    suggestions: &'static [PromptSuggestion],
}

impl EventEmitter<PromptSelected> for PromptSuggestions {}

impl PromptSuggestions {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            suggestions: &SUGGESTIONS,
        }
    }

    fn render_card(
        &self,
        index: usize,
        suggestion: PromptSuggestion,
        cx: &mut Context<Self>,
    ) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id(("prompt-suggestion", index))
            .flex_1()
            .min_w_0()
            .gap_1()
            .p_3()
            .rounded_lg()
            .border_1()
            .border_color(theme.border)
            .bg(theme.background)
            .cursor_pointer()
            .hover(|card| card.bg(theme.accent))
            .child(div().text_sm().font_weight(FontWeight::MEDIUM).child(suggestion.title))
            .child(
                div()
                    .text_xs()
                    .text_color(theme.muted_foreground)
                    .child(suggestion.prompt),
            )
            .on_click(cx.listener(move |_, _, _window, cx| {
                cx.emit(PromptSelected {
                    prompt: suggestion.prompt,
                });
            }))
    }
}

impl Render for PromptSuggestions {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let rows = self
            .suggestions
            .chunks(COLUMNS)
            .enumerate()
            .map(|(row, chunk)| {
                h_flex().w_full().gap_3().children(
                    chunk
                        .iter()
                        .enumerate()
                        .map(|(column, suggestion)| {
                            self.render_card(row * COLUMNS + column, *suggestion, cx)
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .collect::<Vec<_>>();

        v_flex()
            .id("prompt-suggestions")
            .w_full()
            .gap_3()
            .child(
                div()
                    .text_sm()
                    .text_color(cx.theme().muted_foreground)
                    .child("Try these prompts"),
            )
            .children(rows)
    }
}
