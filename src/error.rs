//! Error types for the edgequake-study library.
//!
//! A single enum, [`StudyError`], covers every failure the session can hit.
//! None of them is fatal to the process:
//!
//! * **Precondition** errors (`MissingCredential`, `NoArtifact`,
//!   `EmptyUserText`) are detected locally by the ask orchestrator before any
//!   network traffic happens. Their `Display` text is the message shown to the
//!   user.
//!
//! * **Input** errors (`UnsupportedFormat`, `RenderFailed`) abort only the
//!   upload or navigation step that produced them; the previously staged
//!   artifact and page position stay valid.
//!
//! * **Remote** errors (`RemoteError`, `NetworkFailure`) are caught at the
//!   orchestrator boundary and rendered as a single `Error: …` line. Nothing
//!   is retried automatically.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-study library.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StudyError {
    // ── Precondition errors ───────────────────────────────────────────────
    /// No API key has been saved in this session.
    #[error("Save an API key first.")]
    MissingCredential,

    /// The user tried to save a blank API key.
    #[error("An empty API key cannot be saved.")]
    EmptyCredential,

    /// Neither a screenshot nor a PDF page is staged.
    #[error("Select a screenshot or a PDF page first.")]
    NoArtifact,

    /// The user message is empty after trimming.
    #[error("Write your message first.")]
    EmptyUserText,

    /// An ask is already in flight.
    #[error("A request is already being sent; wait for the answer.")]
    Busy,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// Upload is not an image, or a document is not a PDF.
    #[error("Unsupported file '{name}': {detail}")]
    UnsupportedFormat { name: String, detail: String },

    /// The PDF render collaborator failed for a page.
    #[error("Rendering failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Remote errors ─────────────────────────────────────────────────────
    /// The endpoint answered with a non-2xx status. `body` is the raw text.
    #[error("HTTP {status}: {body}")]
    RemoteError { status: u16, body: String },

    /// Transport-level failure before any status was received.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The response body did not have a recognised shape.
    ///
    /// Only ever logged; extraction falls back to showing the raw body.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // ── Collaborator errors ───────────────────────────────────────────────
    /// Clipboard write failed on every available path.
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// A front-end command argument was not understood.
    #[error("{0}")]
    Usage(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudyError {
    /// `true` for the errors the ask orchestrator reports without touching
    /// the network.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            StudyError::MissingCredential
                | StudyError::NoArtifact
                | StudyError::EmptyUserText
                | StudyError::Busy
        )
    }

    /// Render the error as the single line shown in the output area.
    ///
    /// Precondition and usage errors are shown bare; everything else is
    /// prefixed with `Error: `. Embedded newlines (multi-line JSON error bodies) are
    /// collapsed so the message always fits on one line.
    pub fn display_line(&self) -> String {
        let text = one_line(&self.to_string());
        if self.is_precondition() || matches!(self, StudyError::Usage(_)) {
            text
        } else {
            format!("Error: {text}")
        }
    }
}

/// Collapse all whitespace runs (including newlines) to single spaces.
pub(crate) fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
