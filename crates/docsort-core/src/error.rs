//! Error types for classification

use docsort_extract::ExtractError;
use thiserror::Error;

/// Result type alias for classification operations
pub type Result<T> = std::result::Result<T, ClassifyError>;

/// Classification error types
///
/// Every variant is a distinct kind so callers can decide per kind whether to
/// retry. Nothing here is ever turned into an `"unknown"` label.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Extraction was requested for an extension no parser handles
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Bytes of a recognized format could not be parsed
    #[error("Extraction failed: {0}")]
    ExtractionFailure(String),

    /// Statistical strategy requested without a loaded model
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// A loaded model produced an unusable probability distribution
    #[error("Model prediction error: {0}")]
    Prediction(String),

    /// Missing or invalid configuration, e.g. remote credentials
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Transport or payload failure from the remote inference endpoint
    #[error("Remote service error: {0}")]
    RemoteServiceError(String),

    /// Strategy selector outside the supported set
    #[error("Unknown classification method: {0}")]
    UnknownMethod(String),

    /// A category template failed validation
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    /// The persisted template store could not be read or written
    #[error("Template store error: {0}")]
    TemplateStore(String),
}

/// Discriminant of [`ClassifyError`], for per-kind handling and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedFormat,
    ExtractionFailure,
    ModelUnavailable,
    Prediction,
    ConfigurationError,
    RemoteServiceError,
    UnknownMethod,
    InvalidCategory,
    TemplateStore,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::ExtractionFailure => "extraction_failure",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::Prediction => "prediction",
            ErrorKind::ConfigurationError => "configuration_error",
            ErrorKind::RemoteServiceError => "remote_service_error",
            ErrorKind::UnknownMethod => "unknown_method",
            ErrorKind::InvalidCategory => "invalid_category",
            ErrorKind::TemplateStore => "template_store",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl ClassifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifyError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ClassifyError::ExtractionFailure(_) => ErrorKind::ExtractionFailure,
            ClassifyError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            ClassifyError::Prediction(_) => ErrorKind::Prediction,
            ClassifyError::ConfigurationError(_) => ErrorKind::ConfigurationError,
            ClassifyError::RemoteServiceError(_) => ErrorKind::RemoteServiceError,
            ClassifyError::UnknownMethod(_) => ErrorKind::UnknownMethod,
            ClassifyError::InvalidCategory(_) => ErrorKind::InvalidCategory,
            ClassifyError::TemplateStore(_) => ErrorKind::TemplateStore,
        }
    }

    /// Whether the same call may succeed if simply repeated
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RemoteServiceError | ErrorKind::TemplateStore
        )
    }
}

impl From<ExtractError> for ClassifyError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat(ext) => ClassifyError::UnsupportedFormat(ext),
            other => ClassifyError::ExtractionFailure(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ClassifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClassifyError::RemoteServiceError(format!("request timed out: {}", err))
        } else if let Some(status) = err.status() {
            ClassifyError::RemoteServiceError(format!("HTTP {}: {}", status.as_u16(), err))
        } else {
            ClassifyError::RemoteServiceError(err.to_string())
        }
    }
}
