use error_common::{codes, AppError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Voice output error: {0}")]
    Voice(String),

    #[error("Recognition error: {0}")]
    Recognition(String),

    #[error("Timed out after {0} seconds waiting for speech")]
    Timeout(u64),

    #[error("Conversation slot busy: cannot start {requested} while {active}")]
    SlotBusy {
        requested: &'static str,
        active: &'static str,
    },

    #[error("Gave up after {0} consecutive recognition failures")]
    RetriesExhausted(u32),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntakeError {
    /// Stable error code reported alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::Yaml(_) => codes::configuration::INVALID_CONFIG,
            Self::Catalog(_) => codes::configuration::CATALOG_INVALID,
            Self::Io(_) => codes::configuration::FILE_UNREADABLE,
            Self::Validation(_) => codes::validation::INVALID_INPUT,
            Self::Voice(_) => codes::voice::SYNTHESIS_FAILED,
            Self::Recognition(_) => codes::voice::RECOGNITION_FAILED,
            Self::Timeout(_) => codes::voice::RECOGNITION_TIMEOUT,
            Self::SlotBusy { .. } => codes::voice::SLOT_BUSY,
            Self::RetriesExhausted(_) => codes::voice::RETRIES_EXHAUSTED,
            Self::Collaborator(_) | Self::Network(_) => codes::collaborator::REQUEST_FAILED,
            Self::Serialization(_) => codes::collaborator::BAD_RESPONSE,
        }
    }
}

impl From<IntakeError> for AppError {
    fn from(error: IntakeError) -> Self {
        match error {
            IntakeError::Config(_)
            | IntakeError::Catalog(_)
            | IntakeError::Yaml(_)
            | IntakeError::Io(_) => AppError::ConfigError(error.to_string()),
            IntakeError::Validation(_) => AppError::ValidationError(error.to_string()),
            IntakeError::Voice(_)
            | IntakeError::Recognition(_)
            | IntakeError::Timeout(_)
            | IntakeError::SlotBusy { .. }
            | IntakeError::RetriesExhausted(_) => AppError::VoiceError(error.to_string()),
            IntakeError::Collaborator(_)
            | IntakeError::Network(_)
            | IntakeError::Serialization(_) => AppError::ExternalError(error.to_string()),
        }
    }
}

pub type IntakeResult<T> = Result<T, IntakeError>;
