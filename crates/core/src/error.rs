//! Error types for Markdown-to-deck conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, analyzing, or rendering.
///
/// Parsing and summarization never fail on document content; only input
/// decoding, style analysis, and rendering produce errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read, or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input bytes were not valid UTF-8.
    #[error("Failed to decode input as UTF-8: {0}")]
    Decode(String),

    /// A referenced file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The template deck could not be analyzed.
    #[error("Failed to analyze {}: {message}", path.display())]
    Analysis { path: PathBuf, message: String },

    /// No layout could be chosen for a slide role.
    #[error("No layout available for role '{role}' (deck has {available} layouts)")]
    LayoutUnresolved { role: String, available: usize },

    /// Any other failure while building a deck.
    #[error("Render error: {0}")]
    Render(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML reading or writing error (for PPTX).
    #[error("XML error: {0}")]
    Xml(String),

    /// Style profile or rules JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap any error as an analysis failure for `path`.
    pub fn analysis(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Error::Analysis {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
