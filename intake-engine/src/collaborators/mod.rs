pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::config::CollaboratorConfig;
use crate::error::IntakeResult;
use crate::record::IntakeRecord;
use crate::triage::{self, Recommendations, Urgency, EMERGENCY_ACTION};

pub use http::HttpCollaborators;

/// What the prediction model returns for one intake record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub predicted_disease: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub diet: Vec<String>,
    #[serde(default)]
    pub medication: Vec<String>,
    #[serde(default)]
    pub workout: Vec<String>,
    /// Numeric or string id of the stored prediction
    #[serde(default, deserialize_with = "id_as_string")]
    pub prediction_id: Option<String>,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(id)) => Some(id),
        Some(other) => Some(other.to_string()),
    })
}

impl PredictionOutcome {
    pub fn urgency(&self, symptom_count: usize) -> Urgency {
        triage::assess(&self.predicted_disease, symptom_count)
    }

    /// Urgency plus age, gender and disease specific advice for `record`
    pub fn recommendations(&self, record: &IntakeRecord) -> Recommendations {
        triage::recommendations(
            &self.predicted_disease,
            record.symptoms.len(),
            record.age,
            record.gender,
        )
    }

    /// Spoken summary of the prediction
    pub fn narration(&self, recommendations: &Recommendations) -> String {
        let mut parts = vec![format!(
            "Based on your symptoms, the predicted condition is {}.",
            self.predicted_disease
        )];
        let description = self.description.trim();
        if !description.is_empty() {
            parts.push(ensure_sentence(description));
        }
        for (label, items) in [
            ("Recommended diet", &self.diet),
            ("Suggested medication", &self.medication),
            ("Helpful activities", &self.workout),
        ] {
            if let Some(list) = spoken_list(items) {
                parts.push(format!("{}: {}.", label, list));
            }
        }
        parts.push(recommendations.urgency.advice().to_string());
        parts.extend(
            recommendations
                .demographic
                .iter()
                .map(|advice| advice.advice.to_string()),
        );
        let signs: Vec<String> = recommendations
            .disease_warning_signs
            .iter()
            .map(|sign| sign.to_string())
            .collect();
        if let Some(list) = spoken_list(&signs) {
            parts.push(format!("Watch for {}. {}", list, EMERGENCY_ACTION));
        }
        parts.join(" ")
    }
}

fn ensure_sentence(text: &str) -> String {
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{}.", text)
    }
}

/// "a", "a and b", "a, b and c"
fn spoken_list(items: &[String]) -> Option<String> {
    let items: Vec<&str> = items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect();
    match items.split_last() {
        None => None,
        Some((last, [])) => Some(last.to_string()),
        Some((last, rest)) => Some(format!("{} and {}", rest.join(", "), last)),
    }
}

/// Disease prediction model, consumed as a black box
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(&self, record: &IntakeRecord) -> IntakeResult<PredictionOutcome>;
}

/// Stateless medical Q&A
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatbotService: Send + Sync {
    async fn ask(&self, question: &str) -> IntakeResult<String>;
}

/// Both collaborators backed by the configured HTTP service
pub fn create_collaborators(
    config: &CollaboratorConfig,
) -> IntakeResult<(Arc<dyn PredictionService>, Arc<dyn ChatbotService>)> {
    let http = Arc::new(HttpCollaborators::new(config)?);
    let prediction: Arc<dyn PredictionService> = http.clone();
    let chatbot: Arc<dyn ChatbotService> = http;
    Ok((prediction, chatbot))
}
