//! Voice Intake Flow Tests
//!
//! These tests drive the whole engine against a local HTTP prediction service:
//! 1. A clean spoken intake is corrected, submitted and narrated
//! 2. Mis-heard answers are re-prompted without losing earlier answers
//! 3. A failing prediction service surfaces an error and leaves the slot idle
//! 4. Voice chat relays questions to the chatbot endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use intake_engine::*;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

type Received = Arc<Mutex<Vec<Value>>>;

async fn predict_ok(State(received): State<Received>, Json(body): Json<Value>) -> Json<Value> {
    received.lock().push(body);
    Json(json!({
        "predicted_disease": "Common Cold",
        "description": "A viral infection of the upper airways",
        "diet": ["warm soup", "citrus fruits"],
        "medication": ["paracetamol"],
        "workout": ["light stretching"],
        "prediction_id": 101
    }))
}

async fn predict_down() -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": "model not loaded"})),
    )
}

async fn chatbot(Json(body): Json<Value>) -> Json<Value> {
    let question = body["question"].as_str().unwrap_or_default().to_string();
    Json(json!({"answer": format!("You asked: {}", question)}))
}

/// Serve `router` on an ephemeral port and return its base URL
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn collaborator_config(base_url: String) -> CollaboratorConfig {
    CollaboratorConfig {
        base_url,
        request_timeout_secs: 5,
        ..CollaboratorConfig::default()
    }
}

fn runner(voice: Arc<ScriptedVoice>, base_url: String) -> DialogueRunner {
    let config = IntakeConfig {
        collaborators: collaborator_config(base_url),
        ..IntakeConfig::default()
    };
    let (prediction, _) = create_collaborators(&config.collaborators).unwrap();
    let controller =
        DialogueController::standard(IntakeCatalog::builtin().unwrap(), config.dialogue);
    DialogueRunner::new(controller, voice, prediction)
}

// ============================================================================
// TEST 1: Clean intake, corrected symptoms, narrated result
// ============================================================================

#[tokio::test]
async fn test_spoken_intake_reaches_prediction_service() {
    println!("\n🩺 TEST 1: Spoken intake end to end");

    let received: Received = Arc::default();
    let router = Router::new()
        .route("/api/predict", post(predict_ok))
        .with_state(received.clone());
    let base_url = serve(router).await;

    let voice = Arc::new(ScriptedVoice::new([
        "32",
        "Female.",
        "nairobi",
        "I have a hay fever and coffin",
        "submit",
    ]));
    let outcome = runner(voice.clone(), base_url).run().await.unwrap();

    let IntakeOutcome::Predicted {
        record,
        prediction,
        recommendations,
        session,
    } = outcome
    else {
        panic!("intake was not submitted");
    };

    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(record.age, 32);
    assert_eq!(record.gender, Gender::Female);
    assert_eq!(record.region, "Nairobi");
    assert_eq!(
        record.symptoms.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["coughing", "high fever"]
    );
    assert_eq!(prediction.prediction_id.as_deref(), Some("101"));
    assert_eq!(recommendations.urgency, Urgency::Low);
    assert_eq!(
        recommendations.demographic,
        vec![triage::YOUNG_ADULT, triage::WOMENS_HEALTH]
    );
    assert_eq!(recommendations.timeline, Urgency::Low.timeline());
    assert!(recommendations.disease_warning_signs.is_empty());

    let bodies = received.lock().clone();
    assert_eq!(
        bodies,
        vec![json!({
            "age": 32,
            "gender": "female",
            "region": "Nairobi",
            "symptoms": ["coughing", "high fever"]
        })]
    );

    let spoken = voice.spoken();
    println!("🔊 {} prompts spoken", spoken.len());
    let narration = spoken.last().unwrap();
    assert!(narration.contains("Common Cold"));
    assert!(narration.contains("Recommended diet: warm soup and citrus fruits."));
    assert!(narration.contains(Urgency::Low.advice()));
    assert!(narration.ends_with(triage::WOMENS_HEALTH.advice));
}

// ============================================================================
// TEST 2: Re-prompts keep earlier answers
// ============================================================================

#[tokio::test]
async fn test_misheard_answers_are_reprompted() {
    println!("\n🩺 TEST 2: Re-prompting keeps progress");

    let received: Received = Arc::default();
    let router = Router::new()
        .route("/api/predict", post(predict_ok))
        .with_state(received.clone());
    let base_url = serve(router).await;

    let voice = Arc::new(ScriptedVoice::new(vec![
        ScriptedReply::from("banana"),
        ScriptedReply::from("forty five"),
        ScriptedReply::Failed("no-speech".to_string()),
        ScriptedReply::from("male"),
        ScriptedReply::from("mombasa"),
        ScriptedReply::from("submit"),
        ScriptedReply::from("headache, nausea"),
        ScriptedReply::from("headache and submit"),
    ]));
    let outcome = runner(voice.clone(), base_url).run().await.unwrap();

    let IntakeOutcome::Predicted { record, .. } = outcome else {
        panic!("intake was not submitted");
    };
    assert_eq!(record.age, 45);
    assert_eq!(record.gender, Gender::Male);
    assert_eq!(record.region, "Mombasa");
    assert_eq!(record.symptoms.len(), 2);
    assert_eq!(voice.remaining(), 0);

    let spoken = voice.spoken();
    assert!(spoken.iter().any(|line| line.contains("age as a number")));
    assert!(spoken.iter().any(|line| line == EMPTY_SUBMISSION_PROMPT));
    assert!(spoken.iter().any(|line| line.starts_with(NOT_HEARD_PREFIX)));
    assert_eq!(received.lock().len(), 1);
}

// ============================================================================
// TEST 3: Prediction failure is reported, not retried
// ============================================================================

#[tokio::test]
async fn test_prediction_failure_surfaces_service_error() {
    println!("\n🩺 TEST 3: Prediction service unavailable");

    let router = Router::new().route("/api/predict", post(predict_down));
    let base_url = serve(router).await;

    let voice = Arc::new(ScriptedVoice::new(["60", "other", "Kisumu", "chills", "submit"]));
    let runner = runner(voice, base_url);
    let err = runner.run().await.unwrap_err();

    assert_eq!(err.code(), "COLLABORATOR_6001");
    let message = err.to_string();
    assert!(message.contains("503"), "{}", message);
    assert!(message.contains("model not loaded"), "{}", message);
    assert_eq!(runner.handle().slot_state(), SlotState::Idle);
}

#[tokio::test]
async fn test_unreachable_prediction_service_is_network_error() {
    // bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let http = HttpCollaborators::new(&collaborator_config(base_url)).unwrap();
    let record = IntakeRecord {
        age: 20,
        gender: Gender::Male,
        region: "Nakuru".to_string(),
        symptoms: ["cough".to_string()].into(),
    };
    let err = http.predict(&record).await.unwrap_err();
    assert!(matches!(err, IntakeError::Network(_)));
}

// ============================================================================
// TEST 4: Voice chat through the chatbot endpoint
// ============================================================================

#[tokio::test]
async fn test_voice_chat_over_http() {
    println!("\n💬 TEST 4: Voice chat");

    let router = Router::new().route("/chatbot/ask", post(chatbot));
    let base_url = serve(router).await;
    let (_, chatbot) = create_collaborators(&collaborator_config(base_url)).unwrap();

    let voice = Arc::new(ScriptedVoice::new(["Is malaria contagious?", "exit"]));
    let chat = VoiceChat::new(voice.clone(), chatbot, DialogueConfig::default());
    let summary = chat.run().await.unwrap();

    assert_eq!(summary.questions_answered, 1);
    assert_eq!(summary.session.status, SessionStatus::Completed);
    assert!(voice
        .spoken()
        .contains(&"You asked: Is malaria contagious".to_string()));
}
