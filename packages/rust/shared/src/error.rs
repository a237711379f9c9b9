//! Error types for promptpage.
//!
//! Library crates use [`PromptPageError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for everything that is not reported
//! back to the issue.

use std::path::PathBuf;

/// Top-level error type for all promptpage operations.
#[derive(Debug, thiserror::Error)]
pub enum PromptPageError {
    /// GitHub API failure: transport, non-success status, or a missing field.
    #[error("GitHub API request failed: {0}")]
    GitHub(String),

    /// Generation service failure.
    #[error("Gemini API request failed: {0}")]
    Generation(String),

    /// No HTML payload could be located in the model response.
    #[error("{message}")]
    Extraction { message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Anything else.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PromptPageError>;

/// `err` followed by each of its sources, joined with `": "`.
///
/// reqwest keeps the cause of a transport failure in its sources, which its
/// `Display` leaves out.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}

impl PromptPageError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an extraction error from any displayable message.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is one of the kinds reported back on the issue.
    ///
    /// Only collaborator failures and extraction failures qualify; config,
    /// I/O and unexpected errors are fatal to the process.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::GitHub(_) | Self::Generation(_) | Self::Extraction { .. }
        )
    }
}
