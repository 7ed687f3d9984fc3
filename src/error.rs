//! Error types for paint session replay.
//!
//! Replay distinguishes two families of failure:
//!
//! - **Decode errors** (`Decompression`, `MalformedDocument`, `FrameTooLarge`,
//!   `TruncatedFrame`) are recoverable. The offending packet or document is
//!   dropped, a [`Diagnostic`](crate::types::Diagnostic) is surfaced to the
//!   event consumer and playback continues.
//! - **Source errors** are fatal. `File` is returned when an archive cannot
//!   be opened; `SourceIo` ends a running session and is returned from
//!   [`ReplaySession::finish`](crate::ReplaySession::finish).
//!
//! ```rust
//! use paintty::ReplayError;
//!
//! let error = ReplayError::malformed_document("expected value at line 1 column 1");
//! assert!(error.is_recoverable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{Diagnostic, DiagnosticKind};

/// Result type alias for replay operations.
pub type Result<T, E = ReplayError> = std::result::Result<T, E>;

/// Main error type for replay operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReplayError {
    #[error("Archive file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Byte source failed")]
    SourceIo {
        #[source]
        source: std::io::Error,
    },

    #[error("Pack decompression failed: {details}")]
    Decompression { details: String },

    #[error("Malformed data document: {details}")]
    MalformedDocument { details: String },

    #[error("Frame of {length} bytes exceeds limit of {limit} bytes")]
    FrameTooLarge { length: u32, limit: u32 },

    #[error("Archive ended inside a frame: expected {expected} bytes, {available} available")]
    TruncatedFrame { expected: usize, available: usize },

    #[error("Unknown brush '{name}'")]
    UnknownBrush { name: String },

    #[error("Replay session has already ended")]
    SessionClosed,

    #[error("Invalid replay configuration: {details}")]
    Config { details: String },
}

impl ReplayError {
    /// Returns whether playback can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ReplayError::Decompression { .. } => true,
            ReplayError::MalformedDocument { .. } => true,
            ReplayError::FrameTooLarge { .. } => true,
            ReplayError::TruncatedFrame { .. } => true,
            ReplayError::UnknownBrush { .. } => true,
            ReplayError::File { .. } => false,
            ReplayError::SourceIo { .. } => false,
            ReplayError::SessionClosed => false,
            ReplayError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ReplayError::File { .. } => vec![
                "Check the archive file exists and is readable",
                "Check file permissions",
            ],
            ReplayError::SourceIo { .. } => vec![
                "Check the byte source is still connected",
                "Retry the replay from the beginning of the archive",
            ],
            ReplayError::Decompression { .. } => vec![
                "Verify the producer compresses packs with zlib and a size prefix",
                "Check the archive for corruption",
            ],
            ReplayError::MalformedDocument { .. } => vec![
                "Verify data packs carry UTF-8 JSON objects",
                "Check the document has an 'action' field",
            ],
            ReplayError::FrameTooLarge { .. } => vec![
                "Raise max_frame_len if the archive legitimately carries large packs",
                "Check the archive for a corrupted length prefix",
            ],
            ReplayError::TruncatedFrame { .. } => vec![
                "Check the archive was fully written",
                "Re-record or re-download the archive",
            ],
            ReplayError::UnknownBrush { .. } => vec![
                "Register the brush with the BrushRegistry",
                "Check the brush name in the recorded session",
            ],
            ReplayError::SessionClosed => vec!["Open a new replay session"],
            ReplayError::Config { .. } => vec![
                "Check the configuration file against the documented fields",
                "Remove unknown keys from the configuration",
            ],
        }
    }

    /// Converts a recoverable decode error into a consumer-facing diagnostic.
    ///
    /// Returns `None` for errors that are not reported as diagnostics.
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        let kind = match self {
            ReplayError::Decompression { .. } => DiagnosticKind::Decompression,
            ReplayError::MalformedDocument { .. } => DiagnosticKind::MalformedDocument,
            ReplayError::FrameTooLarge { .. } => DiagnosticKind::FrameTooLarge,
            ReplayError::TruncatedFrame { .. } => DiagnosticKind::TruncatedFrame,
            _ => return None,
        };
        Some(Diagnostic { kind, message: self.to_string() })
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        ReplayError::File { path, source }
    }

    /// Helper constructor for decompression failures.
    pub fn decompression(details: impl Into<String>) -> Self {
        ReplayError::Decompression { details: details.into() }
    }

    /// Helper constructor for malformed data documents.
    pub fn malformed_document(details: impl Into<String>) -> Self {
        ReplayError::MalformedDocument { details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        ReplayError::Config { details: details.into() }
    }
}

impl From<std::io::Error> for ReplayError {
    fn from(err: std::io::Error) -> Self {
        ReplayError::SourceIo { source: err }
    }
}
