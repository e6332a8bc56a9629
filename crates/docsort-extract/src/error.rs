//! Error types for text extraction

use thiserror::Error;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur while turning a document into text
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The filename extension is not one we know how to read
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The bytes claim a supported format but the parser rejected them
    #[error("Corrupt {format} document: {message}")]
    Corrupt { format: String, message: String },

    /// The OCR engine could not run or exited unsuccessfully
    #[error("OCR error: {0}")]
    Ocr(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    pub(crate) fn corrupt(format: impl Into<String>, message: impl ToString) -> Self {
        ExtractError::Corrupt {
            format: format.into(),
            message: message.to_string(),
        }
    }

    /// True when the caller could never have succeeded with this filename
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ExtractError::UnsupportedFormat(_))
    }
}
