use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use snafu::{ResultExt, ensure};

use crate::error::{
    ClipboardError, CreateExportDirSnafu, EmptyTranscriptSnafu, ExportResult,
    WriteExportFileSnafu,
};
use crate::message::{Message, MessageId, Role};

pub const EXPORT_FILE_PREFIX: &str = "chat-";
pub const EXPORT_FILE_SUFFIX: &str = ".txt";
pub const EXPORT_MIME_TYPE: &str = "text/plain";

/// Ordered message list with a revision counter.
///
/// The revision changes on every mutation of the list or of a message body, and
/// on nothing else, so views can key auto-scrolling off it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
    revision: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.bump();
    }

    /// Replaces the body of one message. Returns false when the id is unknown.
    pub fn replace_content(&mut self, id: MessageId, content: impl Into<String>) -> bool {
        let Some(message) = self.messages.iter_mut().find(|message| message.id == id) else {
            return false;
        };

        let content = content.into();
        if message.content != content {
            message.content = content;
            self.bump();
        }
        true
    }

    /// Drops every message after the most recent user message.
    ///
    /// Returns the number of removed messages.
    pub fn truncate_after_last_user(&mut self) -> usize {
        let keep = self
            .messages
            .iter()
            .rposition(|message| message.role == Role::User)
            .map_or(0, |index| index + 1);
        let removed = self.messages.len() - keep;

        if removed > 0 {
            self.messages.truncate(keep);
            self.bump();
        }
        removed
    }

    pub fn clear(&mut self) {
        if self.messages.is_empty() {
            return;
        }

        self.messages.clear();
        self.bump();
    }

    /// Flattens the transcript into `"<Label>: <content>"` blocks.
    pub fn to_text(&self) -> String {
        render_text(&self.messages)
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Joins messages as `"<Label>: <content>"` separated by one blank line.
pub fn render_text(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| format!("{}: {}", message.role.label(), message.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds `chat-<timestamp>.txt` with a millisecond UTC timestamp such as
/// `2024-05-01T09:30:00.000Z`.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!(
        "{EXPORT_FILE_PREFIX}{}{EXPORT_FILE_SUFFIX}",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Payload handed to the download collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub contents: String,
}

impl ExportFile {
    pub fn from_transcript(transcript: &Transcript, now: DateTime<Utc>) -> ExportResult<Self> {
        ensure!(
            !transcript.is_empty(),
            EmptyTranscriptSnafu {
                stage: "build-export-file",
            }
        );

        Ok(Self {
            file_name: export_file_name(now),
            mime_type: EXPORT_MIME_TYPE,
            contents: transcript.to_text(),
        })
    }
}

/// Saves an exported transcript somewhere the user can find it.
pub trait ExportTarget {
    fn save(&self, file: &ExportFile) -> ExportResult<PathBuf>;
}

/// Writes exports into one directory, creating it on first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryExport {
    directory: PathBuf,
}

impl DirectoryExport {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ExportTarget for DirectoryExport {
    fn save(&self, file: &ExportFile) -> ExportResult<PathBuf> {
        std::fs::create_dir_all(&self.directory).context(CreateExportDirSnafu {
            stage: "create-export-directory",
            path: self.directory.clone(),
        })?;

        let path = self.directory.join(on_disk_name(&file.file_name));
        std::fs::write(&path, file.contents.as_bytes()).context(WriteExportFileSnafu {
            stage: "write-export-file",
            path: path.clone(),
        })?;

        tracing::info!(path = ?path, bytes = file.contents.len(), "exported transcript");
        Ok(path)
    }
}

#[cfg(windows)]
fn on_disk_name(file_name: &str) -> String {
    // NTFS rejects ':' in file names.
    file_name.replace(':', "-")
}

#[cfg(not(windows))]
fn on_disk_name(file_name: &str) -> String {
    file_name.to_string()
}

/// Plain-text clipboard sink.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample() -> Transcript {
        let mut transcript = Transcript::new();
        transcript.push(Message::user(MessageId::new(1), "Hi"));
        transcript.push(Message::assistant(MessageId::new(2), "Hello"));
        transcript
    }

    #[test]
    fn renders_labelled_blocks_separated_by_blank_line() {
        assert_eq!(sample().to_text(), "User: Hi\n\nAssistant: Hello");
    }

    #[test]
    fn multi_line_content_is_kept_verbatim() {
        let messages = vec![Message::assistant(MessageId::new(1), "a\n\nb")];
        assert_eq!(render_text(&messages), "Assistant: a\n\nb");
        assert_eq!(render_text(&[]), "");
    }

    #[test]
    fn revision_tracks_content_changes_only() {
        let mut transcript = sample();
        let revision = transcript.revision();

        assert!(transcript.replace_content(MessageId::new(2), "Hello"));
        assert_eq!(transcript.revision(), revision);

        assert!(transcript.replace_content(MessageId::new(2), "Hello there"));
        assert_eq!(transcript.revision(), revision + 1);

        assert!(!transcript.replace_content(MessageId::new(99), "nope"));
        assert_eq!(transcript.revision(), revision + 1);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut transcript = sample();
        transcript.clear();
        let revision = transcript.revision();
        transcript.clear();

        assert!(transcript.is_empty());
        assert_eq!(transcript.revision(), revision);
    }

    #[test]
    fn truncate_drops_trailing_assistant_turns() {
        let mut transcript = sample();
        assert_eq!(transcript.truncate_after_last_user(), 1);
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.truncate_after_last_user(), 0);
    }

    #[test]
    fn export_name_uses_iso_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 7).unwrap();
        assert_eq!(export_file_name(now), "chat-2024-05-01T09:30:07.000Z.txt");
    }

    #[test]
    fn export_of_empty_transcript_is_rejected() {
        let error = ExportFile::from_transcript(&Transcript::new(), Utc::now()).unwrap_err();
        assert!(matches!(error, crate::error::ExportError::EmptyTranscript { .. }));
    }

    #[test]
    fn directory_export_writes_the_transcript() {
        let temp = tempfile::tempdir().unwrap();
        let directory = temp.path().join("exports");
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 7).unwrap();
        let file = ExportFile::from_transcript(&sample(), now).unwrap();

        let path = DirectoryExport::new(&directory).save(&file).unwrap();

        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some(on_disk_name("chat-2024-05-01T09:30:07.000Z.txt").as_str())
        );
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "User: Hi\n\nAssistant: Hello"
        );
    }
}
