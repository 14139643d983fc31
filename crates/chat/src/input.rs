/// Height of one rendered text row, in pixels.
pub const LINE_HEIGHT: f32 = 24.0;
/// Rows the input grows to before it starts scrolling.
pub const MAX_ROWS: usize = 5;

/// Measures the natural height of a block of text as it would be laid out.
pub trait TextMeasure {
    fn content_height(&self, text: &str) -> f32;
}

/// Estimates wrapped text height from an average glyph width.
///
/// Each hard line wraps into `ceil(chars / chars_per_line)` visual lines (at
/// least one), and a trailing newline opens one more.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrappedLineMeasure {
    pub wrap_width: f32,
    pub char_width: f32,
    pub line_height: f32,
}

impl WrappedLineMeasure {
    pub const DEFAULT_CHAR_WIDTH: f32 = 7.5;

    pub fn new(wrap_width: f32) -> Self {
        Self {
            wrap_width,
            char_width: Self::DEFAULT_CHAR_WIDTH,
            line_height: LINE_HEIGHT,
        }
    }

    fn chars_per_line(&self) -> usize {
        (self.wrap_width / self.char_width.max(1.0)).floor().max(1.0) as usize
    }

    pub fn visual_lines(&self, text: &str) -> usize {
        let chars_per_line = self.chars_per_line();
        let mut lines = text
            .lines()
            .map(|line| line.chars().count().max(1).div_ceil(chars_per_line))
            .sum::<usize>();

        if text.ends_with('\n') {
            lines += 1;
        }
        lines.max(1)
    }
}

impl Default for WrappedLineMeasure {
    fn default() -> Self {
        Self::new(560.0)
    }
}

impl TextMeasure for WrappedLineMeasure {
    fn content_height(&self, text: &str) -> f32 {
        self.visual_lines(text) as f32 * self.line_height
    }
}

/// Converts a content height into a row count in `1..=MAX_ROWS`.
pub fn row_count(content_height: f32) -> usize {
    let rows = (content_height / LINE_HEIGHT).floor();
    if rows.is_nan() || rows < 1.0 {
        return 1;
    }
    (rows as usize).min(MAX_ROWS)
}

/// Keys the input reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    Enter { shift: bool, alt: bool },
    Other,
}

impl InputKey {
    pub const ENTER: Self = Self::Enter {
        shift: false,
        alt: false,
    };
    pub const SHIFT_ENTER: Self = Self::Enter {
        shift: true,
        alt: false,
    };
}

/// What a key press did to the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Plain Enter with a usable draft; carries the trimmed text.
    Submitted(String),
    /// Plain Enter swallowed without submitting (blank draft or loading).
    Suppressed,
    /// Modified Enter appended a line break.
    NewlineInserted,
    /// Not a key the input handles; the platform default applies.
    Ignored,
}

/// Which affordance sits next to the text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Send { enabled: bool },
    Stop,
}

/// Draft text plus its derived row count.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftInput {
    draft: String,
    rows: usize,
    content_height: f32,
    loading: bool,
}

impl Default for DraftInput {
    fn default() -> Self {
        Self {
            draft: String::new(),
            rows: 1,
            content_height: LINE_HEIGHT,
            loading: false,
        }
    }
}

impl DraftInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Natural height of the current draft under the last measure.
    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn can_submit(&self) -> bool {
        !self.loading && !self.draft.trim().is_empty()
    }

    pub fn action(&self) -> InputAction {
        if self.loading {
            InputAction::Stop
        } else {
            InputAction::Send {
                enabled: self.can_submit(),
            }
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Replaces the draft and recomputes the row count.
    pub fn set_draft(&mut self, text: impl Into<String>, measure: &impl TextMeasure) {
        self.draft = text.into();
        self.remeasure(measure);
    }

    pub fn remeasure(&mut self, measure: &impl TextMeasure) {
        self.content_height = measure.content_height(&self.draft);
        self.rows = row_count(self.content_height);
    }

    pub fn handle_key(&mut self, key: InputKey, measure: &impl TextMeasure) -> KeyOutcome {
        match key {
            InputKey::Enter {
                shift: false,
                alt: false,
            } => match self.submit() {
                Some(text) => KeyOutcome::Submitted(text),
                None => KeyOutcome::Suppressed,
            },
            InputKey::Enter { .. } => {
                if self.loading {
                    return KeyOutcome::Suppressed;
                }
                self.draft.push('\n');
                self.remeasure(measure);
                KeyOutcome::NewlineInserted
            }
            InputKey::Other => KeyOutcome::Ignored,
        }
    }

    /// Takes the trimmed draft if it can be submitted, resetting the input.
    pub fn submit(&mut self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }

        let text = self.draft.trim().to_string();
        self.draft.clear();
        self.rows = 1;
        self.content_height = LINE_HEIGHT;
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is one line tall so heights are easy to reason about.
    struct PerLine;

    impl TextMeasure for PerLine {
        fn content_height(&self, text: &str) -> f32 {
            WrappedLineMeasure::new(10_000.0).content_height(text)
        }
    }

    #[test]
    fn whitespace_only_drafts_never_submit() {
        let mut input = DraftInput::new();
        for draft in ["", " ", "\n\n", "\t  \n "] {
            input.set_draft(draft, &PerLine);
            assert_eq!(input.handle_key(InputKey::ENTER, &PerLine), KeyOutcome::Suppressed);
            assert_eq!(input.submit(), None);
            assert_eq!(input.draft(), draft);
        }
    }

    #[test]
    fn submit_trims_and_resets_rows() {
        let mut input = DraftInput::new();
        input.set_draft("  one\ntwo\nthree\nfour\nfive\nsix  ", &PerLine);
        assert_eq!(input.rows(), MAX_ROWS);

        assert_eq!(
            input.handle_key(InputKey::ENTER, &PerLine),
            KeyOutcome::Submitted("one\ntwo\nthree\nfour\nfive\nsix".to_string())
        );
        assert_eq!(input.draft(), "");
        assert_eq!(input.rows(), 1);
    }

    #[test]
    fn modified_enter_inserts_newline_without_submitting() {
        let mut input = DraftInput::new();
        input.set_draft("hello", &PerLine);

        assert_eq!(
            input.handle_key(InputKey::SHIFT_ENTER, &PerLine),
            KeyOutcome::NewlineInserted
        );
        assert_eq!(
            input.handle_key(
                InputKey::Enter {
                    shift: false,
                    alt: true
                },
                &PerLine
            ),
            KeyOutcome::NewlineInserted
        );
        assert_eq!(input.draft(), "hello\n\n");
        assert_eq!(input.rows(), 3);
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut input = DraftInput::new();
        input.set_draft("x", &PerLine);
        assert_eq!(input.handle_key(InputKey::Other, &PerLine), KeyOutcome::Ignored);
        assert_eq!(input.draft(), "x");
    }

    #[test]
    fn rows_grow_monotonically_and_cap_at_five() {
        let measure = WrappedLineMeasure::new(75.0);
        let mut input = DraftInput::new();
        let mut previous = 1;

        for length in 0..400 {
            input.set_draft("a".repeat(length), &measure);
            assert!(input.rows() >= previous);
            assert!((1..=MAX_ROWS).contains(&input.rows()));
            previous = input.rows();
        }
        assert_eq!(previous, MAX_ROWS);
    }

    #[test]
    fn row_count_floors_and_clamps() {
        assert_eq!(row_count(0.0), 1);
        assert_eq!(row_count(47.9), 1);
        assert_eq!(row_count(48.0), 2);
        assert_eq!(row_count(10_000.0), MAX_ROWS);
        assert_eq!(row_count(f32::NAN), 1);
    }

    #[test]
    fn selected_suggestion_replaces_draft_without_submitting() {
        let mut input = DraftInput::new();
        input.set_draft("half-typed", &PerLine);

        let suggestion = crate::suggestions::SUGGESTIONS[1];
        input.set_draft(suggestion.prompt, &PerLine);

        assert_eq!(input.draft(), suggestion.prompt);
        assert_eq!(input.action(), InputAction::Send { enabled: true });
    }

    #[test]
    fn loading_disables_submit_and_exposes_stop() {
        let mut input = DraftInput::new();
        input.set_draft("queued", &PerLine);
        input.set_loading(true);

        assert_eq!(input.action(), InputAction::Stop);
        assert_eq!(input.handle_key(InputKey::ENTER, &PerLine), KeyOutcome::Suppressed);
        assert_eq!(input.submit(), None);
        assert_eq!(input.draft(), "queued");

        input.set_loading(false);
        assert_eq!(input.action(), InputAction::Send { enabled: true });
    }
}
