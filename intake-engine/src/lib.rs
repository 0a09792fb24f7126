//! Voice-driven symptom intake
//!
//! Collects a patient's age, gender, region and symptoms through a spoken
//! dialogue, snaps what was heard onto fixed vocabularies, and hands the
//! finished record to a disease prediction service.
//!
//! # Pieces
//!
//! - **Fuzzy matcher**: case-insensitive edit distance against a vocabulary,
//!   with a correction table for common mis-transcriptions ("hay fever" →
//!   "high fever") applied first. Symptoms only snap within a threshold;
//!   gender and region always snap to the nearest entry.
//! - **Dialogue controller**: a pure transition function over explicit state.
//!   Each event yields the next state plus effects (speak, listen, submit).
//! - **Runner**: performs the effects against a [`VoiceIo`], one at a time on
//!   a single [`ConversationSlot`], with a listen timeout, bounded retries
//!   and cancellation through a [`DialogueHandle`].
//! - **Triage**: urgency, age and gender specific advice, an action timeline
//!   and warning signs for the predicted disease, spoken after the prediction.
//! - **Collaborators**: [`PredictionService`] and [`ChatbotService`], with
//!   JSON-over-HTTP implementations in [`HttpCollaborators`].
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use intake_engine::{
//!     create_collaborators, DialogueController, DialogueRunner, IntakeCatalog, IntakeConfig,
//!     IntakeOutcome, ScriptedVoice,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IntakeConfig::from_env()?;
//! let catalog = IntakeCatalog::load(config.catalog_path.as_deref())?;
//! let (prediction, _chatbot) = create_collaborators(&config.collaborators)?;
//!
//! let voice = Arc::new(ScriptedVoice::new(["32", "female", "nairobi", "hay fever", "submit"]));
//! let controller = DialogueController::standard(catalog, config.dialogue.clone());
//! let runner = DialogueRunner::new(controller, voice, prediction);
//!
//! if let IntakeOutcome::Predicted { prediction, recommendations, .. } = runner.run().await? {
//!     println!("{} ({})", prediction.predicted_disease, recommendations.urgency);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod chat;
pub mod collaborators;
pub mod config;
pub mod corrections;
pub mod dialogue;
pub mod error;
pub mod matcher;
pub mod record;
pub mod runner;
pub mod session;
pub mod slot;
pub mod steps;
pub mod triage;
pub mod utterance;
pub mod voice;

pub use catalog::*;
pub use chat::*;
pub use collaborators::*;
pub use config::*;
pub use corrections::*;
pub use dialogue::*;
pub use error::*;
pub use matcher::*;
pub use record::*;
pub use runner::*;
pub use session::*;
pub use slot::*;
pub use steps::*;
pub use triage::{assess, Recommendations, Urgency};
pub use voice::*;
