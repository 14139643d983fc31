/// Emitted when the user confirms a non-blank draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub content: String,
}

impl Submit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Emitted when the user asks to halt the in-flight generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stop;

/// Emitted when a starter prompt is picked from the welcome panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptSelected {
    pub prompt: &'static str,
}

/// Emitted by the error panel's retry button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryRequested;

/// Emitted by the error panel's dismiss button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDismissed;
