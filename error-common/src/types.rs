use thiserror::Error;

use crate::codes;
use crate::context::ErrorContext;

/// Top-level error for binaries built on the intake workspace
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Voice input/output failures that ended a session
    #[error("Voice error: {0}")]
    VoiceError(String),

    /// Prediction or chatbot service failures
    #[error("External service error: {0}")]
    ExternalError(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Stable error code for this error category
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => codes::configuration::INVALID_CONFIG,
            Self::VoiceError(_) => codes::voice::RECOGNITION_FAILED,
            Self::ExternalError(_) => codes::collaborator::REQUEST_FAILED,
            Self::ValidationError(_) => codes::validation::INVALID_INPUT,
            Self::Other(_) => codes::internal::UNEXPECTED,
        }
    }
}

/// Result type alias for application operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Log an error with its code and context
pub fn log_error(code: &str, error: &dyn std::error::Error, context: &ErrorContext) {
    tracing::error!(
        error_code = code,
        error = %error,
        context = %context.to_log_field(),
        "Intake error occurred"
    );
}
