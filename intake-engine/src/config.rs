use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{IntakeError, IntakeResult};

/// Where the prediction and chatbot collaborators live
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CollaboratorConfig {
    pub base_url: String,
    pub predict_path: String,
    pub chatbot_path: String,
    pub request_timeout_secs: u64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            predict_path: "/api/predict".to_string(),
            chatbot_path: "/chatbot/ask".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl CollaboratorConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Tuning for the voice intake dialogue
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Largest edit distance at which a symptom clause is snapped to the vocabulary
    pub symptom_max_distance: usize,
    /// Upper bound on a single listen before it counts as a recognition failure
    pub listen_timeout_secs: u64,
    /// Consecutive recognition failures tolerated on one step
    pub max_recognition_retries: u32,
    /// Utterances that finish the symptom step
    pub completion_keywords: Vec<String>,
    /// Utterances that end a voice chat
    pub chat_exit_keywords: Vec<String>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            symptom_max_distance: 3,
            listen_timeout_secs: 30,
            max_recognition_retries: 5,
            completion_keywords: vec!["submit".to_string()],
            chat_exit_keywords: vec![
                "goodbye".to_string(),
                "stop".to_string(),
                "exit".to_string(),
            ],
        }
    }
}

impl DialogueConfig {
    pub fn listen_timeout(&self) -> Duration {
        Duration::from_secs(self.listen_timeout_secs)
    }
}

/// Intake service configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub collaborators: CollaboratorConfig,
    pub dialogue: DialogueConfig,
    /// JSON catalog replacing the built-in vocabularies
    pub catalog_path: Option<PathBuf>,
}

impl IntakeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> IntakeResult<Self> {
        let defaults = Self::default();

        let collaborators = CollaboratorConfig {
            base_url: std::env::var("INTAKE_PREDICTION_URL")
                .unwrap_or(defaults.collaborators.base_url),
            predict_path: std::env::var("INTAKE_PREDICT_PATH")
                .unwrap_or(defaults.collaborators.predict_path),
            chatbot_path: std::env::var("INTAKE_CHATBOT_PATH")
                .unwrap_or(defaults.collaborators.chatbot_path),
            request_timeout_secs: std::env::var("INTAKE_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.collaborators.request_timeout_secs),
        };

        let dialogue = DialogueConfig {
            symptom_max_distance: std::env::var("INTAKE_SYMPTOM_MAX_DISTANCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.dialogue.symptom_max_distance),
            listen_timeout_secs: std::env::var("INTAKE_LISTEN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.dialogue.listen_timeout_secs),
            max_recognition_retries: std::env::var("INTAKE_MAX_RECOGNITION_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.dialogue.max_recognition_retries),
            completion_keywords: std::env::var("INTAKE_COMPLETION_KEYWORDS")
                .ok()
                .map(|s| split_keywords(&s))
                .unwrap_or(defaults.dialogue.completion_keywords),
            chat_exit_keywords: std::env::var("INTAKE_CHAT_EXIT_KEYWORDS")
                .ok()
                .map(|s| split_keywords(&s))
                .unwrap_or(defaults.dialogue.chat_exit_keywords),
        };

        let config = Self {
            collaborators,
            dialogue,
            catalog_path: std::env::var("INTAKE_CATALOG_PATH").ok().map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file; missing keys take their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> IntakeResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> IntakeResult<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> IntakeResult<()> {
        if self.dialogue.completion_keywords.is_empty() {
            return Err(IntakeError::Config(
                "at least one completion keyword is required".to_string(),
            ));
        }
        if self.dialogue.listen_timeout_secs == 0 {
            return Err(IntakeError::Config(
                "listen_timeout_secs must be positive".to_string(),
            ));
        }
        if !self.collaborators.base_url.starts_with("http://")
            && !self.collaborators.base_url.starts_with("https://")
        {
            return Err(IntakeError::Config(format!(
                "collaborator base_url must be an http(s) URL: {}",
                self.collaborators.base_url
            )));
        }
        Ok(())
    }
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = IntakeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dialogue.symptom_max_distance, 3);
        assert_eq!(config.dialogue.completion_keywords, vec!["submit"]);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = IntakeConfig::from_yaml_str(
            "collaborators:\n  base_url: https://predict.example.org\ndialogue:\n  max_recognition_retries: 2\n",
        )
        .unwrap();

        assert_eq!(config.collaborators.base_url, "https://predict.example.org");
        assert_eq!(config.collaborators.predict_path, "/api/predict");
        assert_eq!(config.dialogue.max_recognition_retries, 2);
        assert_eq!(config.dialogue.listen_timeout_secs, 30);
    }

    #[test]
    fn test_rejects_empty_completion_keywords() {
        let err = IntakeConfig::from_yaml_str("dialogue:\n  completion_keywords: []\n").unwrap_err();
        assert!(matches!(err, IntakeError::Config(_)));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let err = IntakeConfig::from_yaml_str("collaborators:\n  base_url: ftp://x\n").unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"dialogue:\n  listen_timeout_secs: 10\n  completion_keywords: [submit, done]\ncatalog_path: /etc/intake/catalog.json\n",
        )
        .unwrap();

        let config = IntakeConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.dialogue.listen_timeout(), Duration::from_secs(10));
        assert_eq!(config.dialogue.completion_keywords, vec!["submit", "done"]);
        assert_eq!(
            config.catalog_path.as_deref(),
            Some(Path::new("/etc/intake/catalog.json"))
        );
    }

    #[test]
    fn test_missing_yaml_file_is_io_error() {
        let err = IntakeConfig::from_yaml_file("/nonexistent/intake.yaml").unwrap_err();
        assert!(matches!(err, IntakeError::Io(_)));
    }

    #[test]
    fn test_split_keywords_normalises() {
        assert_eq!(split_keywords(" Submit, DONE ,,"), vec!["submit", "done"]);
    }
}
