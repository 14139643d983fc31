use std::path::PathBuf;

use chrono::{DateTime, Utc};
use snafu::ensure;

use crate::error::{ClipboardError, ExportResult, NothingToCopySnafu};
use crate::feedback::{CopyFeedback, FeedbackTicket};
use crate::message::{Message, MessageId};
use crate::transcript::{Clipboard, ExportFile, ExportTarget, Transcript};

/// Identifier for one generation (a submit or a retry).
///
/// Every generation gets a fresh id so late chunks from a stopped or failed
/// stream can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenerationId(pub u64);

impl GenerationId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Routing key carried by every stream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamTarget {
    pub generation_id: GenerationId,
}

impl StreamTarget {
    pub const fn new(generation_id: GenerationId) -> Self {
        Self { generation_id }
    }
}

/// Conversation lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    /// Request sent, no assistant content yet.
    Submitting(StreamTarget),
    /// Assistant content is arriving.
    Streaming(StreamTarget),
    Error {
        target: StreamTarget,
        message: String,
    },
}

/// Input to the phase table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseTransition {
    Submit(StreamTarget),
    Content(StreamTarget),
    Complete(StreamTarget),
    Fail {
        target: StreamTarget,
        message: String,
    },
    Cancel(StreamTarget),
    Retry(StreamTarget),
    Dismiss,
}

/// Why a transition was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionRejection {
    AlreadyActive {
        active: StreamTarget,
        attempted: StreamTarget,
    },
    NoActiveGeneration,
    TargetMismatch {
        active: StreamTarget,
        attempted: StreamTarget,
    },
    NotInError,
}

pub type TransitionResult = Result<SessionPhase, TransitionRejection>;

impl SessionPhase {
    /// Target of the in-flight generation, if any.
    pub fn active_target(&self) -> Option<StreamTarget> {
        match self {
            Self::Submitting(target) | Self::Streaming(target) => Some(*target),
            Self::Idle | Self::Error { .. } => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.active_target().is_some()
    }

    /// Applies one transition without mutating `self`.
    pub fn apply(&self, transition: PhaseTransition) -> TransitionResult {
        match transition {
            PhaseTransition::Submit(target) => match self.active_target() {
                Some(active) => Err(TransitionRejection::AlreadyActive {
                    active,
                    attempted: target,
                }),
                None => Ok(Self::Submitting(target)),
            },
            PhaseTransition::Content(target) => {
                self.require_active(target)?;
                Ok(Self::Streaming(target))
            }
            PhaseTransition::Complete(target) | PhaseTransition::Cancel(target) => {
                self.require_active(target)?;
                Ok(Self::Idle)
            }
            PhaseTransition::Fail { target, message } => {
                self.require_active(target)?;
                Ok(Self::Error { target, message })
            }
            PhaseTransition::Retry(target) => match self {
                Self::Error { .. } => Ok(Self::Submitting(target)),
                _ => Err(TransitionRejection::NotInError),
            },
            PhaseTransition::Dismiss => match self {
                Self::Error { .. } => Ok(Self::Idle),
                _ => Err(TransitionRejection::NotInError),
            },
        }
    }

    fn require_active(&self, target: StreamTarget) -> Result<(), TransitionRejection> {
        match self.active_target() {
            Some(active) if active == target => Ok(()),
            Some(active) => Err(TransitionRejection::TargetMismatch {
                active,
                attempted: target,
            }),
            None => Err(TransitionRejection::NoActiveGeneration),
        }
    }
}

/// Work order for the streaming provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub target: StreamTarget,
    pub history: Vec<Message>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    BlankInput,
    GenerationActive,
}

/// Conversation state behind the transcript view.
#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Transcript,
    phase: SessionPhase,
    streaming_reply: Option<MessageId>,
    copy_feedback: CopyFeedback,
    next_message_id: u64,
    next_generation_id: u64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase.is_loading()
    }

    /// True until the first assistant content supersedes the placeholder.
    pub fn shows_composing_indicator(&self) -> bool {
        matches!(self.phase, SessionPhase::Submitting(_))
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            SessionPhase::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn copy_feedback_active(&self) -> bool {
        self.copy_feedback.is_active()
    }

    /// Appends the user message and opens a new generation.
    pub fn submit(&mut self, text: &str) -> Result<Generation, SubmitRejected> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitRejected::BlankInput);
        }

        let target = self.peek_target();
        self.phase = self
            .phase
            .apply(PhaseTransition::Submit(target))
            .map_err(|_| SubmitRejected::GenerationActive)?;
        self.next_generation_id += 1;
        self.streaming_reply = None;

        let id = self.alloc_message_id();
        self.transcript.push(Message::user(id, text));

        Ok(self.generation(target))
    }

    /// Installs the full assistant content received so far.
    ///
    /// Returns false for stale or unexpected targets.
    pub fn apply_snapshot(&mut self, target: StreamTarget, content: impl Into<String>) -> bool {
        let Ok(next) = self.phase.apply(PhaseTransition::Content(target)) else {
            return false;
        };
        self.phase = next;

        let content = content.into();
        match self.streaming_reply {
            Some(id) => {
                self.transcript.replace_content(id, content);
            }
            None => {
                let id = self.alloc_message_id();
                self.transcript.push(Message::assistant(id, content));
                self.streaming_reply = Some(id);
            }
        }
        true
    }

    pub fn complete(&mut self, target: StreamTarget) -> bool {
        self.finish(PhaseTransition::Complete(target))
    }

    pub fn fail(&mut self, target: StreamTarget, message: impl Into<String>) -> bool {
        self.finish(PhaseTransition::Fail {
            target,
            message: message.into(),
        })
    }

    /// Cancels the active generation, keeping whatever content already arrived.
    pub fn stop(&mut self) -> Option<StreamTarget> {
        let target = self.phase.active_target()?;
        self.finish(PhaseTransition::Cancel(target)).then_some(target)
    }

    /// Re-issues the failed request.
    ///
    /// Partial assistant output from the failed attempt is dropped; user turns are
    /// left untouched.
    pub fn retry(&mut self) -> Option<Generation> {
        let target = self.peek_target();
        let next = self.phase.apply(PhaseTransition::Retry(target)).ok()?;

        if !self.messages().iter().any(|message| message.role.is_user()) {
            return None;
        }

        self.transcript.truncate_after_last_user();
        self.phase = next;
        self.next_generation_id += 1;
        self.streaming_reply = None;
        Some(self.generation(target))
    }

    pub fn dismiss_error(&mut self) -> bool {
        match self.phase.apply(PhaseTransition::Dismiss) {
            Ok(next) => {
                self.phase = next;
                true
            }
            Err(_) => false,
        }
    }

    /// Empties the transcript. Any active generation is cancelled and returned.
    pub fn clear_chat(&mut self) -> Option<StreamTarget> {
        let cancelled = self.stop();
        self.dismiss_error();
        self.transcript.clear();
        self.streaming_reply = None;
        cancelled
    }

    pub fn transcript_text(&self) -> String {
        self.transcript.to_text()
    }

    /// Writes the transcript to the clipboard and raises the copied flag.
    pub fn copy_chat(
        &mut self,
        clipboard: &mut impl Clipboard,
    ) -> Result<FeedbackTicket, ClipboardError> {
        ensure!(
            !self.transcript.is_empty(),
            NothingToCopySnafu { stage: "copy-chat" }
        );

        clipboard.write_text(&self.transcript_text())?;
        Ok(self.copy_feedback.mark_copied())
    }

    pub fn expire_copy_feedback(&mut self, ticket: FeedbackTicket) -> bool {
        self.copy_feedback.expire(ticket)
    }

    pub fn export_chat(
        &self,
        target: &impl ExportTarget,
        now: DateTime<Utc>,
    ) -> ExportResult<PathBuf> {
        let file = ExportFile::from_transcript(&self.transcript, now)?;
        target.save(&file)
    }

    fn finish(&mut self, transition: PhaseTransition) -> bool {
        match self.phase.apply(transition) {
            Ok(next) => {
                self.phase = next;
                self.streaming_reply = None;
                true
            }
            Err(rejection) => {
                tracing::debug!(?rejection, "ignored stale generation event");
                false
            }
        }
    }

    fn generation(&self, target: StreamTarget) -> Generation {
        Generation {
            target,
            history: self.transcript.messages().to_vec(),
        }
    }

    fn peek_target(&self) -> StreamTarget {
        StreamTarget::new(GenerationId::new(self.next_generation_id + 1))
    }

    fn alloc_message_id(&mut self) -> MessageId {
        self.next_message_id = self.next_message_id.saturating_add(1);
        MessageId::new(self.next_message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[derive(Default)]
    struct RecordingClipboard {
        text: Option<String>,
        fail: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::Unavailable {
                    stage: "test",
                    details: "denied".to_string(),
                });
            }
            self.text = Some(text.to_string());
            Ok(())
        }
    }

    fn contents(session: &ChatSession) -> Vec<(Role, &str)> {
        session
            .messages()
            .iter()
            .map(|message| (message.role, message.content.as_str()))
            .collect()
    }

    #[test]
    fn phase_table_follows_the_happy_path() {
        let target = StreamTarget::new(GenerationId::new(1));
        let phase = SessionPhase::Idle
            .apply(PhaseTransition::Submit(target))
            .unwrap();
        assert_eq!(phase, SessionPhase::Submitting(target));

        let phase = phase.apply(PhaseTransition::Content(target)).unwrap();
        assert_eq!(phase, SessionPhase::Streaming(target));

        let phase = phase.apply(PhaseTransition::Complete(target)).unwrap();
        assert_eq!(phase, SessionPhase::Idle);
    }

    #[test]
    fn phase_table_rejects_illegal_moves() {
        let active = StreamTarget::new(GenerationId::new(1));
        let other = StreamTarget::new(GenerationId::new(2));
        let streaming = SessionPhase::Streaming(active);

        assert_eq!(
            streaming.apply(PhaseTransition::Submit(other)),
            Err(TransitionRejection::AlreadyActive {
                active,
                attempted: other
            })
        );
        assert_eq!(
            streaming.apply(PhaseTransition::Complete(other)),
            Err(TransitionRejection::TargetMismatch {
                active,
                attempted: other
            })
        );
        assert_eq!(
            SessionPhase::Idle.apply(PhaseTransition::Cancel(active)),
            Err(TransitionRejection::NoActiveGeneration)
        );
        assert_eq!(
            SessionPhase::Idle.apply(PhaseTransition::Retry(active)),
            Err(TransitionRejection::NotInError)
        );
        assert_eq!(
            streaming.apply(PhaseTransition::Dismiss),
            Err(TransitionRejection::NotInError)
        );
    }

    #[test]
    fn snapshots_replace_the_streaming_reply() {
        let mut session = ChatSession::new();
        let generation = session.submit("  Hi  ").unwrap();
        assert!(session.shows_composing_indicator());
        assert_eq!(generation.history.len(), 1);

        assert!(session.apply_snapshot(generation.target, "Hel"));
        assert!(!session.shows_composing_indicator());
        assert!(session.apply_snapshot(generation.target, "Hello"));
        assert!(session.complete(generation.target));

        assert_eq!(
            contents(&session),
            vec![(Role::User, "Hi"), (Role::Assistant, "Hello")]
        );
        assert!(!session.is_loading());
    }

    #[test]
    fn only_one_generation_at_a_time() {
        let mut session = ChatSession::new();
        session.submit("first").unwrap();

        assert_eq!(
            session.submit("second"),
            Err(SubmitRejected::GenerationActive)
        );
        assert_eq!(session.submit("   "), Err(SubmitRejected::BlankInput));
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn stop_keeps_partial_content_and_ignores_late_chunks() {
        let mut session = ChatSession::new();
        let generation = session.submit("Tell me a story").unwrap();
        session.apply_snapshot(generation.target, "Once upon");

        assert_eq!(session.stop(), Some(generation.target));
        assert!(!session.apply_snapshot(generation.target, "Once upon a time"));
        assert!(!session.complete(generation.target));

        assert_eq!(session.phase(), &SessionPhase::Idle);
        assert_eq!(session.messages()[1].content, "Once upon");
        assert_eq!(session.stop(), None);
    }

    #[test]
    fn failure_then_retry_reissues_without_duplicating_the_prompt() {
        let mut session = ChatSession::new();
        let first = session.submit("Hi").unwrap();
        session.apply_snapshot(first.target, "partial");
        assert!(session.fail(first.target, "rate limited"));
        assert_eq!(session.error(), Some("rate limited"));

        let retry = session.retry().unwrap();
        assert_ne!(retry.target, first.target);
        assert_eq!(retry.history, vec![Message::user(MessageId::new(1), "Hi")]);
        assert_eq!(session.phase(), &SessionPhase::Submitting(retry.target));
        assert_eq!(session.error(), None);

        assert!(!session.apply_snapshot(first.target, "stale"));
        assert!(session.apply_snapshot(retry.target, "Hello"));
        assert_eq!(
            contents(&session),
            vec![(Role::User, "Hi"), (Role::Assistant, "Hello")]
        );
    }

    #[test]
    fn dismissing_an_error_returns_to_idle() {
        let mut session = ChatSession::new();
        let generation = session.submit("Hi").unwrap();
        session.fail(generation.target, "boom");

        assert!(session.dismiss_error());
        assert_eq!(session.phase(), &SessionPhase::Idle);
        assert!(session.retry().is_none());
        assert!(!session.dismiss_error());
    }

    #[test]
    fn clear_chat_is_idempotent_and_cancels() {
        let mut session = ChatSession::new();
        let generation = session.submit("Hi").unwrap();

        assert_eq!(session.clear_chat(), Some(generation.target));
        assert!(session.messages().is_empty());
        assert_eq!(session.clear_chat(), None);
        assert!(session.messages().is_empty());
        assert!(!session.is_loading());
    }

    #[test]
    fn copy_chat_writes_labelled_transcript() {
        let mut session = ChatSession::new();
        let generation = session.submit("Hi").unwrap();
        session.apply_snapshot(generation.target, "Hello");
        session.complete(generation.target);

        let mut clipboard = RecordingClipboard::default();
        let ticket = session.copy_chat(&mut clipboard).unwrap();

        assert_eq!(clipboard.text.as_deref(), Some("User: Hi\n\nAssistant: Hello"));
        assert!(session.copy_feedback_active());
        assert!(session.expire_copy_feedback(ticket));
        assert!(!session.copy_feedback_active());
    }

    #[test]
    fn failed_copy_leaves_feedback_unset() {
        let mut session = ChatSession::new();
        session.submit("Hi").unwrap();

        let mut clipboard = RecordingClipboard {
            fail: true,
            ..Default::default()
        };
        assert!(session.copy_chat(&mut clipboard).is_err());
        assert!(!session.copy_feedback_active());

        let mut empty = ChatSession::new();
        assert!(matches!(
            empty.copy_chat(&mut RecordingClipboard::default()),
            Err(ClipboardError::NothingToCopy { .. })
        ));
    }

    /// Accepts writes but cannot report what the platform stored.
    struct WriteOnlyClipboard;

    impl Clipboard for WriteOnlyClipboard {
        fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
            Ok(())
        }
    }

    #[test]
    fn accepted_write_counts_as_copied() {
        let mut session = ChatSession::new();
        session.submit("line one\r\nline two").unwrap();

        let ticket = session.copy_chat(&mut WriteOnlyClipboard).unwrap();
        assert!(session.copy_feedback_active());
        assert!(session.expire_copy_feedback(ticket));
    }
}
