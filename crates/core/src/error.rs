//! Error types for presentation text replacement.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The upload or its companion payload was rejected.
    #[error("{0}")]
    InvalidInput(String),

    /// The replacement rules failed parsing or schema validation.
    #[error("{0}")]
    Validation(String),

    /// A structurally valid presentation could not be processed.
    #[error("Processing error: {0}")]
    Processing(String),

    /// A part the package must contain is absent.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),
}

impl Error {
    /// Whether the error was caused by what the caller sent.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::Validation(_))
    }
}
