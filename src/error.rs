//! Error types for the markpage library.
//!
//! Errors fall into three groups:
//!
//! * [`ExportError::EmptyMarkdown`] is **user input**: the note has
//!   nothing to export. Recoverable; the `Display` text is written for end users and
//!   can be shown verbatim.
//!
//! * Pipeline failures ([`ExportError::Sanitize`], [`ExportError::Render`],
//!   [`ExportError::OutputWriteFailed`], [`ExportError::Internal`]) are logged
//!   by the exporter and returned unchanged. There is no retry and no partial
//!   document: a failed export never hands anything to the sink.
//!
//! * Malformed Markdown is **not** an error. The compiler degrades to
//!   literal text instead.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the markpage library.
#[derive(Debug, Error)]
pub enum ExportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The Markdown was empty or contained only whitespace.
    #[error("There is nothing to export yet.\nAdd some text to the note and try again.")]
    EmptyMarkdown,

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// The HTML rewriter rejected the compiled document.
    #[error("Failed to sanitize compiled HTML: {detail}")]
    Sanitize { detail: String },

    /// The PDF could not be serialised.
    #[error("Failed to render PDF: {detail}")]
    Render { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{path}': {source}\nCheck the output directory exists and is writable.")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExportError {
    /// True for errors caused by what the user typed rather than by the
    /// pipeline itself.
    pub fn is_user_error(&self) -> bool {
        matches!(self, ExportError::EmptyMarkdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_markdown_has_friendly_message() {
        let msg = ExportError::EmptyMarkdown.to_string();
        assert!(msg.contains("nothing to export"), "got: {msg}");
        assert!(ExportError::EmptyMarkdown.is_user_error());
    }

    #[test]
    fn output_write_failed_display() {
        let e = ExportError::OutputWriteFailed {
            path: PathBuf::from("/tmp/notes.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/tmp/notes.pdf"));
        assert!(msg.contains("denied"));
        assert!(!e.is_user_error());
    }

    #[test]
    fn render_display() {
        let e = ExportError::Render {
            detail: "xref overflow".into(),
        };
        assert!(e.to_string().contains("xref overflow"));
    }
}
