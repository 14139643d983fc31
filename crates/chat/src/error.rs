use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ExportError {
    #[snafu(display("nothing to export, the transcript is empty"))]
    EmptyTranscript { stage: &'static str },
    #[snafu(display("failed to create export directory at {path:?} on `{stage}`: {source}"))]
    CreateExportDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to write export file at {path:?} on `{stage}`: {source}"))]
    WriteExportFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClipboardError {
    #[snafu(display("nothing to copy, the transcript is empty"))]
    NothingToCopy { stage: &'static str },
    #[snafu(display("clipboard is unavailable on `{stage}`: {details}"))]
    Unavailable {
        stage: &'static str,
        details: String,
    },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to extract settings on `{stage}`: {source}"))]
    Extract {
        stage: &'static str,
        #[snafu(source(from(figment::Error, Box::new)))]
        source: Box<figment::Error>,
    },
}

pub type ExportResult<T> = Result<T, ExportError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
