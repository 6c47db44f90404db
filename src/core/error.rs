//! Import errors and their reporting keys.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::limits::LimitViolation;

/// Error taxonomy, including the non-fatal per-fragment skip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnreadableInput,
    CopyFailed,
    ExtractFailed,
    MalformedContent,
    UnsupportedContentType,
    /// Non-fatal: a fragment produced no question
    SkippedUnrecognizedFragment,
}

impl ErrorKind {
    /// Stable key for the localized-error sink
    pub fn key(&self) -> &'static str {
        match self {
            ErrorKind::UnreadableInput => "h5p.error.unreadable_input",
            ErrorKind::CopyFailed => "h5p.error.copy_failed",
            ErrorKind::ExtractFailed => "h5p.error.extract_failed",
            ErrorKind::MalformedContent => "h5p.error.malformed_content",
            ErrorKind::UnsupportedContentType => "h5p.error.unsupported_content_type",
            ErrorKind::SkippedUnrecognizedFragment => "h5p.warning.skipped_fragment",
        }
    }

    /// Whether this kind aborts the whole import
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ErrorKind::SkippedUnrecognizedFragment)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Fatal import errors
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Cannot read package {path}: {source}")]
    UnreadableInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stage package into {path}: {source}")]
    CopyFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract {path}: {reason}")]
    ExtractFailed { path: PathBuf, reason: String },

    #[error("Malformed package content in {file}: {reason}")]
    MalformedContent { file: String, reason: String },

    #[error("Unsupported H5P content type: {library}")]
    UnsupportedContentType { library: String },
}

impl ImportError {
    /// Taxonomy entry for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImportError::UnreadableInput { .. } => ErrorKind::UnreadableInput,
            ImportError::CopyFailed { .. } => ErrorKind::CopyFailed,
            ImportError::ExtractFailed { .. } => ErrorKind::ExtractFailed,
            ImportError::MalformedContent { .. } => ErrorKind::MalformedContent,
            ImportError::UnsupportedContentType { .. } => ErrorKind::UnsupportedContentType,
        }
    }

    pub(crate) fn extract(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        ImportError::ExtractFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(file: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ImportError::MalformedContent {
            file: file.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised by an archive extractor
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid or corrupt archive: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Limit(#[from] LimitViolation),
}
