//! HTTP client for the prediction and chatbot endpoints
//!
//! Both endpoints live on the same service and speak JSON. Non-success
//! responses carry an `{"error": "..."}` body which is surfaced in the
//! returned [`IntakeError::Collaborator`].
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collaborators::{ChatbotService, PredictionOutcome, PredictionService};
use crate::config::CollaboratorConfig;
use crate::error::{IntakeError, IntakeResult};
use crate::record::{Gender, IntakeRecord};

const FALLBACK_ANSWER: &str = "I didn't understand that.";

pub struct HttpCollaborators {
    client: reqwest::Client,
    base_url: String,
    predict_path: String,
    chatbot_path: String,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    age: u8,
    gender: Gender,
    region: &'a str,
    symptoms: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default = "fallback_answer")]
    answer: String,
}

fn fallback_answer() -> String {
    FALLBACK_ANSWER.to_string()
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

impl HttpCollaborators {
    pub fn new(config: &CollaboratorConfig) -> IntakeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            predict_path: config.predict_path.clone(),
            chatbot_path: config.chatbot_path.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> IntakeResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(url = %url, "collaborator request");

        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&error_text)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or(error_text);
            warn!(url = %url, status = %status, "collaborator rejected request");
            return Err(IntakeError::Collaborator(format!(
                "{} returned {}: {}",
                path, status, detail
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            IntakeError::Collaborator(format!("unexpected response from {}: {}", path, e))
        })
    }
}

#[async_trait]
impl PredictionService for HttpCollaborators {
    async fn predict(&self, record: &IntakeRecord) -> IntakeResult<PredictionOutcome> {
        let request = PredictRequest {
            age: record.age,
            gender: record.gender,
            region: &record.region,
            symptoms: record.symptoms.iter().map(String::as_str).collect(),
        };
        let outcome: PredictionOutcome = self.post_json(&self.predict_path, &request).await?;
        if outcome.predicted_disease.trim().is_empty() {
            return Err(IntakeError::Collaborator(
                "prediction response has no disease".to_string(),
            ));
        }
        debug!(disease = %outcome.predicted_disease, "prediction received");
        Ok(outcome)
    }
}

#[async_trait]
impl ChatbotService for HttpCollaborators {
    async fn ask(&self, question: &str) -> IntakeResult<String> {
        let response: ChatResponse = self
            .post_json(&self.chatbot_path, &ChatRequest { question })
            .await?;
        Ok(response.answer)
    }
}
