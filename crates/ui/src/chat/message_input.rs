use confab_chat::input::MAX_ROWS;
use confab_chat::{DraftInput, InputAction, InputKey, KeyOutcome, WrappedLineMeasure};
use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::{
    ActiveTheme, Disableable, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Enter as InputEnter, Input, InputEvent, InputState},
    v_flex,
};

use crate::chat::events::{Stop, Submit};

pub const INPUT_PLACEHOLDER: &str = "Ask me anything...";

pub struct MessageInput {
    input_state: Entity<InputState>,
    draft: DraftInput,
    measure: WrappedLineMeasure,
}

impl EventEmitter<Submit> for MessageInput {}
impl EventEmitter<Stop> for MessageInput {}

impl MessageInput {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let input_state = cx.new(|cx| {
            InputState::new(window, cx)
                .placeholder(INPUT_PLACEHOLDER)
                .auto_grow(1, MAX_ROWS)
        });

        cx.subscribe_in(
            &input_state,
            window,
            |this, _, _event: &InputEvent, _window, cx| {
                this.sync_draft(cx);
            },
        )
        .detach();

        Self {
            input_state,
            draft: DraftInput::new(),
            measure: WrappedLineMeasure::default(),
        }
    }

    pub fn draft(&self) -> &str {
        self.draft.draft()
    }

    pub fn set_loading(&mut self, loading: bool, cx: &mut Context<Self>) {
        if self.draft.is_loading() == loading {
            return;
        }
        self.draft.set_loading(loading);
        cx.notify();
    }

    /// Overwrites the draft verbatim; nothing is submitted.
    pub fn set_draft(&mut self, text: &str, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state.update(cx, |state, cx| {
            state.set_value(text.to_string(), window, cx);
        });
        self.draft.set_draft(text, &self.measure);
        cx.notify();
    }

    fn sync_draft(&mut self, cx: &mut Context<Self>) {
        let value = self.input_state.read(cx).value().to_string();
        if value != self.draft.draft() {
            self.draft.set_draft(value, &self.measure);
            cx.notify();
        }
    }

    /// Owns every Enter before the field sees it, so the field never inserts
    /// a line break of its own.
    fn capture_enter(&mut self, _: &InputEnter, window: &mut Window, cx: &mut Context<Self>) {
        cx.stop_propagation();
        self.sync_draft(cx);
        self.handle_key(enter_key(window.modifiers()), window, cx);
    }

    fn handle_key(&mut self, key: InputKey, window: &mut Window, cx: &mut Context<Self>) {
        match self.draft.handle_key(key, &self.measure) {
            KeyOutcome::Submitted(content) => {
                self.input_state.update(cx, |state, cx| {
                    state.set_value("", window, cx);
                });
                cx.emit(Submit::new(content));
            }
            KeyOutcome::NewlineInserted => {
                self.input_state.update(cx, |state, cx| {
                    state.insert("\n", window, cx);
                });
                self.sync_draft(cx);
            }
            KeyOutcome::Suppressed | KeyOutcome::Ignored => {}
        }
        cx.notify();
    }

    fn handle_send(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.sync_draft(cx);
        if let Some(content) = self.draft.submit() {
            self.input_state.update(cx, |state, cx| {
                state.set_value("", window, cx);
            });
            cx.emit(Submit::new(content));
            cx.notify();
        }
    }

    fn handle_stop(&mut self, cx: &mut Context<Self>) {
        if !self.draft.is_loading() {
            return;
        }
        cx.emit(Stop);
    }
}

impl Render for MessageInput {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let loading = self.draft.is_loading();

        let action = match self.draft.action() {
            InputAction::Stop => Button::new("stop")
                .small()
                .danger()
                .icon(IconName::CircleX)
                .tooltip("Stop generating")
                .on_click(cx.listener(|this, _, _window, cx| {
                    this.handle_stop(cx);
                }))
                .into_any_element(),
            InputAction::Send { enabled } => Button::new("send")
                .small()
                .primary()
                .icon(IconName::ArrowUp)
                .disabled(!enabled)
                .on_click(cx.listener(|this, _, window, cx| {
                    this.handle_send(window, cx);
                }))
                .into_any_element(),
        };

        v_flex()
            .bg(theme.background)
            .gap_2()
            .p_3()
            .child(
                h_flex()
                    .w_full()
                    .gap_2()
                    .items_end()
                    .px_3()
                    .py_2()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.background)
                    .capture_action(cx.listener(Self::capture_enter))
                    // Modified Enter with no field binding arrives as a plain key press.
                    .on_key_down(cx.listener(|this, event: &KeyDownEvent, window, cx| {
                        let modifiers = event.keystroke.modifiers;
                        if event.keystroke.key == "enter" && (modifiers.shift || modifiers.alt) {
                            cx.stop_propagation();
                            this.sync_draft(cx);
                            this.handle_key(enter_key(modifiers), window, cx);
                        }
                    }))
                    .child(
                        div().flex_1().child(
                            Input::new(&self.input_state)
                                .w_full()
                                .appearance(false)
                                .disabled(loading),
                        ),
                    )
                    .child(action),
            )
            .when(loading, |column| {
                column.child(
                    h_flex().w_full().justify_center().child(
                        Button::new("stop-generating")
                            .ghost()
                            .xsmall()
                            .label("Stop generating")
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.handle_stop(cx);
                            })),
                    ),
                )
            })
    }
}

/// Maps the modifiers held with Enter onto the draft's key table.
fn enter_key(modifiers: Modifiers) -> InputKey {
    InputKey::Enter {
        shift: modifiers.shift,
        alt: modifiers.alt,
    }
}
