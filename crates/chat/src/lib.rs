pub mod config;
pub mod error;
pub mod feedback;
pub mod input;
pub mod markdown;
pub mod message;
pub mod scroll;
pub mod session;
pub mod suggestions;
pub mod transcript;

pub use config::{ChatConfig, ConfigStore, ThemeChoice};
pub use error::{ClipboardError, ConfigError, ExportError};
pub use feedback::{COPY_FEEDBACK_DURATION, CopyFeedback, FeedbackTicket};
pub use input::{DraftInput, InputAction, InputKey, KeyOutcome, TextMeasure, WrappedLineMeasure};
pub use message::{Message, MessageId, Role};
pub use scroll::{ChangeTracker, SMOOTH_SCROLL_DURATION, ScrollAnimation};
pub use session::{ChatSession, Generation, GenerationId, SessionPhase, StreamTarget};
pub use suggestions::{PromptSuggestion, SUGGESTIONS};
pub use transcript::{Clipboard, DirectoryExport, ExportFile, ExportTarget, Transcript};
