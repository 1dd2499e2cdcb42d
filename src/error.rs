//! Error types for the edgequake-finhealth library.
//!
//! Failures fall into three families that the controller recovers from in
//! three different ways:
//!
//! * [`ValidationError`]: the selected file is not an acceptable PDF. Shown
//!   to the user; nothing else changes.
//!
//! * [`AnalysisError`]: the initial report analysis failed (provider error,
//!   empty reply, reply that does not match the schema). The session is torn
//!   down and the controller returns to idle with one notice.
//!
//! * [`ChatTurnError`]: a single follow-up question failed. The session
//!   survives; a friendly fallback answer is appended instead.
//!
//! [`FinHealthError`] wraps all of them for the top-level entry points, next
//! to the configuration and provider errors that happen before any document
//! is touched. [`TransitionError`] is the controller's own rejection of an
//! event that is not valid in the current phase.

use crate::controller::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-finhealth entry points.
#[derive(Debug, Error)]
pub enum FinHealthError {
    /// The selected file was rejected by intake.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The report analysis failed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    // ── Provider errors ───────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The selected file cannot be used as a report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The declared media type is not `application/pdf`.
    #[error("Unsupported file type '{media_type}' for '{name}': only application/pdf is accepted")]
    UnsupportedMediaType { name: String, media_type: String },

    /// Input file was not found at the given path.
    #[error("Report file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file declares itself a PDF but does not start with `%PDF`.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// The file has no content at all.
    #[error("Report '{name}' is empty")]
    EmptyFile { name: String },

    /// Any other I/O failure while reading the file.
    #[error("Failed to read '{path}': {detail}")]
    ReadFailed { path: PathBuf, detail: String },
}

impl ValidationError {
    /// True when the file could not be read at all, as opposed to being read
    /// and found not to be a PDF.
    pub fn is_read_failure(&self) -> bool {
        matches!(
            self,
            ValidationError::FileNotFound { .. }
                | ValidationError::PermissionDenied { .. }
                | ValidationError::ReadFailed { .. }
        )
    }
}

/// The report analysis call did not produce a usable result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// The provider call itself failed (network, auth, rate limit, …).
    #[error("LLM API error: {message}")]
    Provider { message: String },

    /// The provider answered but the reply carried no text.
    #[error("No response text received from the model")]
    EmptyResponse,

    /// The reply text is not an `AnalysisResult`.
    #[error("Model reply does not match the analysis schema: {detail}")]
    SchemaMismatch { detail: String },

    /// The configured per-call timeout expired.
    #[error("Analysis timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// A single chat turn failed. Never tears down the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatTurnError {
    /// The provider call failed.
    #[error("Chat turn failed: {message}")]
    Provider { message: String },

    /// The configured per-call timeout expired.
    #[error("Chat turn timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// An event the controller refused because of its current phase.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// A chat turn is already in flight; sends are serialised.
    #[error("A message is already being answered")]
    Busy,

    /// Sending requires a finished analysis and an open chat session.
    #[error("No report is ready for questions (current phase: {phase:?})")]
    NotReady { phase: Phase },

    /// An analysis completion arrived while nothing was being analysed.
    #[error("No analysis is in flight (current phase: {phase:?})")]
    NotAnalyzing { phase: Phase },

    /// A chat completion arrived while no turn was in flight.
    #[error("No chat turn is in flight")]
    NotSending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_media_type_display() {
        let e = ValidationError::UnsupportedMediaType {
            name: "image.png".into(),
            media_type: "image/png".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("image/png"), "got: {msg}");
        assert!(msg.contains("application/pdf"), "got: {msg}");
    }

    #[test]
    fn validation_wraps_transparently() {
        let e: FinHealthError = ValidationError::EmptyFile {
            name: "report.pdf".into(),
        }
        .into();
        assert_eq!(e.to_string(), "Report 'report.pdf' is empty");
    }

    #[test]
    fn analysis_timeout_display() {
        let e = AnalysisError::Timeout { secs: 30 };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn not_ready_mentions_phase() {
        let e = TransitionError::NotReady { phase: Phase::Idle };
        assert!(e.to_string().contains("Idle"));
    }
}
