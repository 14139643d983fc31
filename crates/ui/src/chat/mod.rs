/// Event contracts for chat module wiring.
pub mod events;
pub mod markdown_view;
/// Bubble rendering for transcript entries.
pub mod message;
pub mod message_input;
pub mod message_list;
pub mod scroll_manager;
pub mod suggestions;
pub mod view;

pub use events::{ErrorDismissed, PromptSelected, RetryRequested, Stop, Submit};
pub use message_input::MessageInput;
pub use message_list::MessageList;
pub use scroll_manager::ScrollManager;
pub use suggestions::PromptSuggestions;
pub use view::ChatView;
