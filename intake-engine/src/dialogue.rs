//! Intake dialogue as an explicit state machine
//!
//! [`DialogueController::transition`] takes the current [`DialogueState`] and
//! one [`DialogueEvent`] and returns the next state together with the
//! [`DialogueEffect`]s the caller must perform, in order. The controller
//! performs no I/O; the runner owns speaking, listening and submission.

use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

use crate::catalog::IntakeCatalog;
use crate::config::DialogueConfig;
use crate::matcher::FuzzyMatcher;
use crate::record::{Gender, IntakeDraft, IntakeField, IntakeRecord};
use crate::steps::{parse_age, StepDescriptor, StepSequence};
use crate::utterance::{clean_answer, is_keyword, split_clauses, strip_filler};

pub const FOLLOW_UP_PROMPT: &str = "Any other symptoms? Say submit when you are done.";
pub const EMPTY_SUBMISSION_PROMPT: &str =
    "I need at least one symptom before I can submit. What symptoms do you have?";
pub const NOT_HEARD_PREFIX: &str = "Sorry, I didn't catch that.";
pub const SUBMITTING_PROMPT: &str = "Thank you. Let me check your symptoms.";
pub const GIVING_UP_PROMPT: &str =
    "Sorry, I am having trouble hearing you. Please try again later.";

/// Where the dialogue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "step", rename_all = "snake_case")]
pub enum DialogueStatus {
    Idle,
    /// Waiting for the answer to step `n`
    AwaitingStep(usize),
    /// Inside the symptom step, after at least one batch
    CollectingSymptoms,
    Completed,
    Aborted,
}

impl DialogueStatus {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            DialogueStatus::AwaitingStep(_) | DialogueStatus::CollectingSymptoms
        )
    }
}

/// Everything the controller needs to remember between events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueState {
    pub status: DialogueStatus,
    pub draft: IntakeDraft,
    /// Consecutive recognition failures on the current step
    pub recognition_failures: u32,
}

impl Default for DialogueState {
    fn default() -> Self {
        Self {
            status: DialogueStatus::Idle,
            draft: IntakeDraft::new(),
            recognition_failures: 0,
        }
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueEvent {
    Start,
    /// Final transcript of one listen cycle
    Transcript(String),
    /// Recognition failed or produced nothing
    RecognitionFailed(String),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    RetriesExhausted(u32),
    InvalidRecord(String),
}

/// Work the caller performs after a transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueEffect {
    Speak(String),
    Listen,
    Submit(IntakeRecord),
    /// Force-stop any in-flight speak or listen
    StopVoice,
    Abort(AbortReason),
}

/// Result of one transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: DialogueState,
    pub effects: Vec<DialogueEffect>,
}

impl Transition {
    fn new(state: DialogueState, effects: Vec<DialogueEffect>) -> Self {
        Self { state, effects }
    }
}

/// Symptoms pulled out of one utterance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomBatch {
    pub symptoms: Vec<String>,
    pub completion_requested: bool,
}

/// Drives the fixed step sequence
#[derive(Debug, Clone)]
pub struct DialogueController {
    steps: StepSequence,
    catalog: IntakeCatalog,
    matcher: FuzzyMatcher,
    config: DialogueConfig,
}

impl DialogueController {
    pub fn new(steps: StepSequence, catalog: IntakeCatalog, config: DialogueConfig) -> Self {
        let matcher = FuzzyMatcher::new(catalog.corrections.clone());
        Self {
            steps,
            catalog,
            matcher,
            config,
        }
    }

    pub fn standard(catalog: IntakeCatalog, config: DialogueConfig) -> Self {
        Self::new(StepSequence::standard(), catalog, config)
    }

    pub fn steps(&self) -> &StepSequence {
        &self.steps
    }

    pub fn catalog(&self) -> &IntakeCatalog {
        &self.catalog
    }

    pub fn matcher(&self) -> &FuzzyMatcher {
        &self.matcher
    }

    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    pub fn initial_state(&self) -> DialogueState {
        DialogueState::default()
    }

    /// Advance the state machine by one event
    pub fn transition(&self, state: DialogueState, event: DialogueEvent) -> Transition {
        match event {
            DialogueEvent::Cancel => Transition::new(
                DialogueState::default(),
                vec![DialogueEffect::StopVoice],
            ),
            DialogueEvent::Start if state.status.is_active() => {
                debug!("start ignored, dialogue already running");
                Transition::new(state, Vec::new())
            }
            DialogueEvent::Start => self.enter_step(DialogueState::default(), 0),
            _ if !state.status.is_active() => {
                debug!(status = ?state.status, "event ignored, dialogue not running");
                Transition::new(state, Vec::new())
            }
            DialogueEvent::RecognitionFailed(reason) => self.recognition_failed(state, &reason),
            DialogueEvent::Transcript(transcript) => {
                if clean_answer(&transcript).is_empty() {
                    self.recognition_failed(state, "empty transcript")
                } else {
                    self.handle_transcript(state, &transcript)
                }
            }
        }
    }

    /// Split, correct and match the symptoms in one utterance
    pub fn extract_symptoms(&self, utterance: &str) -> SymptomBatch {
        let mut batch = SymptomBatch::default();
        for clause in split_clauses(utterance) {
            if is_keyword(&clause, &self.config.completion_keywords) {
                batch.completion_requested = true;
                continue;
            }
            let stripped = strip_filler(&clause);
            if stripped.is_empty() {
                continue;
            }
            let matched = self.matcher.match_with_threshold(
                &stripped,
                &self.catalog.symptoms,
                self.config.symptom_max_distance,
            );
            debug!(
                clause = %stripped,
                symptom = %matched.value,
                distance = matched.distance,
                matched = matched.matched,
                "symptom clause"
            );
            batch.symptoms.push(matched.value);
        }
        batch
    }

    fn enter_step(&self, mut state: DialogueState, index: usize) -> Transition {
        state.recognition_failures = 0;
        match self.steps.get(index) {
            Some(step) => {
                state.status = DialogueStatus::AwaitingStep(index);
                Transition::new(
                    state,
                    vec![
                        DialogueEffect::Speak(step.prompt.clone()),
                        DialogueEffect::Listen,
                    ],
                )
            }
            None => self.abort(
                state,
                AbortReason::InvalidRecord(format!("no step at index {}", index)),
            ),
        }
    }

    fn current_step(&self, status: DialogueStatus) -> Option<(usize, &StepDescriptor)> {
        let index = match status {
            DialogueStatus::AwaitingStep(index) => index,
            DialogueStatus::CollectingSymptoms => self.steps.last_index(),
            _ => return None,
        };
        self.steps.get(index).map(|step| (index, step))
    }

    fn current_prompt(&self, status: DialogueStatus) -> String {
        match (status, self.current_step(status)) {
            (DialogueStatus::CollectingSymptoms, _) => FOLLOW_UP_PROMPT.to_string(),
            (_, Some((_, step))) => step.prompt.clone(),
            _ => String::new(),
        }
    }

    fn recognition_failed(&self, mut state: DialogueState, reason: &str) -> Transition {
        state.recognition_failures += 1;
        debug!(
            reason,
            failures = state.recognition_failures,
            "recognition failed"
        );
        if state.recognition_failures > self.config.max_recognition_retries {
            let failures = state.recognition_failures;
            return self.abort(state, AbortReason::RetriesExhausted(failures));
        }
        let prompt = format!("{} {}", NOT_HEARD_PREFIX, self.current_prompt(state.status));
        Transition::new(
            state,
            vec![
                DialogueEffect::Speak(prompt.trim_end().to_string()),
                DialogueEffect::Listen,
            ],
        )
    }

    fn abort(&self, mut state: DialogueState, reason: AbortReason) -> Transition {
        state.status = DialogueStatus::Aborted;
        let mut effects = Vec::new();
        if matches!(reason, AbortReason::RetriesExhausted(_)) {
            effects.push(DialogueEffect::Speak(GIVING_UP_PROMPT.to_string()));
        }
        effects.push(DialogueEffect::Abort(reason));
        Transition::new(state, effects)
    }

    fn handle_transcript(&self, mut state: DialogueState, transcript: &str) -> Transition {
        state.recognition_failures = 0;
        let Some((index, step)) = self.current_step(state.status) else {
            return Transition::new(state, Vec::new());
        };

        if step.field == IntakeField::Symptoms {
            return self.handle_symptoms(state, transcript);
        }

        let answer = clean_answer(transcript);
        if !step.accepts(answer) || !self.fill_field(&mut state.draft, step.field, answer) {
            debug!(step = %step.field, "answer rejected, re-prompting");
            return Transition::new(
                state,
                vec![
                    DialogueEffect::Speak(step.retry_prompt.clone()),
                    DialogueEffect::Listen,
                ],
            );
        }

        self.enter_step(state, index + 1)
    }

    /// Normalise `answer` into the draft; false when it cannot be used
    fn fill_field(&self, draft: &mut IntakeDraft, field: IntakeField, answer: &str) -> bool {
        match field {
            IntakeField::Age => match parse_age(answer) {
                Some(age) => {
                    draft.set_age(age);
                    true
                }
                None => false,
            },
            IntakeField::Gender => {
                let snapped = self.matcher.snap(answer, &self.catalog.genders);
                match Gender::from_str(&snapped.value) {
                    Ok(gender) => {
                        draft.set_gender(gender);
                        true
                    }
                    Err(_) => false,
                }
            }
            IntakeField::Region => {
                let snapped = self.matcher.snap(answer, &self.catalog.regions);
                draft.set_region(snapped.value);
                true
            }
            IntakeField::Symptoms => false,
        }
    }

    fn handle_symptoms(&self, mut state: DialogueState, transcript: &str) -> Transition {
        let batch = self.extract_symptoms(transcript);
        let added = state.draft.add_symptoms(batch.symptoms);
        debug!(
            added,
            total = state.draft.symptoms().len(),
            completion = batch.completion_requested,
            "symptom batch"
        );

        if !batch.completion_requested {
            state.status = DialogueStatus::CollectingSymptoms;
            return Transition::new(
                state,
                vec![
                    DialogueEffect::Speak(FOLLOW_UP_PROMPT.to_string()),
                    DialogueEffect::Listen,
                ],
            );
        }

        if !state.draft.has_symptoms() {
            return Transition::new(
                state,
                vec![
                    DialogueEffect::Speak(EMPTY_SUBMISSION_PROMPT.to_string()),
                    DialogueEffect::Listen,
                ],
            );
        }

        match state.draft.clone().finalize() {
            Ok(record) => {
                state.status = DialogueStatus::Completed;
                Transition::new(
                    state,
                    vec![
                        DialogueEffect::Speak(SUBMITTING_PROMPT.to_string()),
                        DialogueEffect::Submit(record),
                    ],
                )
            }
            Err(e) => self.abort(state, AbortReason::InvalidRecord(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> DialogueController {
        DialogueController::standard(IntakeCatalog::builtin().unwrap(), DialogueConfig::default())
    }

    fn feed(
        controller: &DialogueController,
        state: DialogueState,
        utterances: &[&str],
    ) -> (DialogueState, Vec<DialogueEffect>) {
        let mut transition = controller.transition(state, DialogueEvent::Start);
        for utterance in utterances {
            transition = controller.transition(
                transition.state,
                DialogueEvent::Transcript(utterance.to_string()),
            );
        }
        (transition.state, transition.effects)
    }

    #[test]
    fn test_start_prompts_first_step() {
        let controller = controller();
        let transition = controller.transition(controller.initial_state(), DialogueEvent::Start);
        assert_eq!(transition.state.status, DialogueStatus::AwaitingStep(0));
        assert_eq!(
            transition.effects,
            vec![
                DialogueEffect::Speak("How old are you?".to_string()),
                DialogueEffect::Listen
            ]
        );
    }

    #[test]
    fn test_non_numeric_age_does_not_advance() {
        let controller = controller();
        let (state, effects) = feed(&controller, controller.initial_state(), &["banana"]);
        assert_eq!(state.status, DialogueStatus::AwaitingStep(0));
        assert_eq!(state.draft.age(), None);
        assert!(matches!(&effects[0], DialogueEffect::Speak(p) if p.contains("age as a number")));
        assert_eq!(effects[1], DialogueEffect::Listen);
    }

    #[test]
    fn test_digit_age_advances() {
        let controller = controller();
        let (state, effects) = feed(&controller, controller.initial_state(), &["32"]);
        assert_eq!(state.status, DialogueStatus::AwaitingStep(1));
        assert_eq!(state.draft.age(), Some(32));
        assert!(matches!(&effects[0], DialogueEffect::Speak(p) if p.contains("gender")));
    }

    #[test]
    fn test_gender_and_region_snap() {
        let controller = controller();
        let (state, _) = feed(&controller, controller.initial_state(), &["40", "Mail.", "kisumo"]);
        assert_eq!(state.draft.gender(), Some(Gender::Male));
        assert_eq!(state.draft.region(), Some("Kisumu"));
        assert_eq!(state.status, DialogueStatus::AwaitingStep(3));
    }

    #[test]
    fn test_symptom_loop_reprompts() {
        let controller = controller();
        let (state, effects) = feed(
            &controller,
            controller.initial_state(),
            &["40", "male", "Nakuru", "headache"],
        );
        assert_eq!(state.status, DialogueStatus::CollectingSymptoms);
        assert_eq!(
            effects,
            vec![
                DialogueEffect::Speak(FOLLOW_UP_PROMPT.to_string()),
                DialogueEffect::Listen
            ]
        );
    }

    #[test]
    fn test_empty_submission_rejected() {
        let controller = controller();
        let (state, effects) = feed(
            &controller,
            controller.initial_state(),
            &["40", "male", "Nakuru", "submit"],
        );
        assert_eq!(state.status, DialogueStatus::AwaitingStep(3));
        assert!(!state.draft.has_symptoms());
        assert_eq!(
            effects,
            vec![
                DialogueEffect::Speak(EMPTY_SUBMISSION_PROMPT.to_string()),
                DialogueEffect::Listen
            ]
        );
    }

    #[test]
    fn test_duplicate_symptoms_across_utterances() {
        let controller = controller();
        let (state, _) = feed(
            &controller,
            controller.initial_state(),
            &["40", "male", "Nakuru", "cough", "cough"],
        );
        assert_eq!(state.draft.symptoms().len(), 1);
        assert!(state.draft.symptoms().contains("cough"));
    }

    #[test]
    fn test_correction_then_split_keeps_clauses() {
        let controller = controller();
        let batch = controller.extract_symptoms("I have a hay fever and cold cough");
        assert_eq!(batch.symptoms, vec!["high fever", "cold and cough"]);
        assert!(!batch.completion_requested);
    }

    #[test]
    fn test_unknown_symptom_kept_verbatim() {
        let controller = controller();
        let batch = controller.extract_symptoms("xyzzyqq");
        assert_eq!(batch.symptoms, vec!["xyzzyqq"]);
    }

    #[test]
    fn test_keyword_in_same_utterance_submits() {
        let controller = controller();
        let (state, effects) = feed(
            &controller,
            controller.initial_state(),
            &["40", "male", "Nakuru", "chills and submit"],
        );
        assert_eq!(state.status, DialogueStatus::Completed);
        assert!(matches!(effects.last(), Some(DialogueEffect::Submit(r)) if r.symptoms.contains("chills")));
    }

    #[test]
    fn test_end_to_end_record() {
        let controller = controller();
        let (state, effects) = feed(
            &controller,
            controller.initial_state(),
            &["32", "female", "nairobi", "hay fever and coffin", "submit"],
        );
        assert_eq!(state.status, DialogueStatus::Completed);
        let expected = IntakeRecord {
            age: 32,
            gender: Gender::Female,
            region: "Nairobi".to_string(),
            symptoms: ["high fever".to_string(), "coughing".to_string()].into(),
        };
        assert_eq!(
            effects,
            vec![
                DialogueEffect::Speak(SUBMITTING_PROMPT.to_string()),
                DialogueEffect::Submit(expected)
            ]
        );
    }

    #[test]
    fn test_recognition_failure_keeps_progress() {
        let controller = controller();
        let (state, _) = feed(&controller, controller.initial_state(), &["32", "female"]);
        let transition = controller.transition(
            state,
            DialogueEvent::RecognitionFailed("no-speech".to_string()),
        );
        assert_eq!(transition.state.status, DialogueStatus::AwaitingStep(2));
        assert_eq!(transition.state.draft.age(), Some(32));
        assert_eq!(transition.state.recognition_failures, 1);
        assert!(matches!(&transition.effects[0], DialogueEffect::Speak(p) if p.starts_with(NOT_HEARD_PREFIX)));
    }

    #[test]
    fn test_retries_exhausted_aborts() {
        let config = DialogueConfig {
            max_recognition_retries: 2,
            ..DialogueConfig::default()
        };
        let controller =
            DialogueController::standard(IntakeCatalog::builtin().unwrap(), config);
        let mut transition = controller.transition(controller.initial_state(), DialogueEvent::Start);
        for _ in 0..2 {
            transition = controller.transition(
                transition.state,
                DialogueEvent::Transcript("   ".to_string()),
            );
            assert!(transition.state.status.is_active());
        }
        transition = controller.transition(
            transition.state,
            DialogueEvent::RecognitionFailed("network".to_string()),
        );
        assert_eq!(transition.state.status, DialogueStatus::Aborted);
        assert_eq!(
            transition.effects.last(),
            Some(&DialogueEffect::Abort(AbortReason::RetriesExhausted(3)))
        );
    }

    #[test]
    fn test_successful_answer_resets_failures() {
        let controller = controller();
        let mut transition = controller.transition(controller.initial_state(), DialogueEvent::Start);
        transition = controller.transition(
            transition.state,
            DialogueEvent::RecognitionFailed("no-speech".to_string()),
        );
        assert_eq!(transition.state.recognition_failures, 1);
        transition =
            controller.transition(transition.state, DialogueEvent::Transcript("50".to_string()));
        assert_eq!(transition.state.recognition_failures, 0);
    }

    #[test]
    fn test_cancel_resets_to_idle() {
        let controller = controller();
        let (state, _) = feed(&controller, controller.initial_state(), &["32"]);
        let transition = controller.transition(state, DialogueEvent::Cancel);
        assert_eq!(transition.state, DialogueState::default());
        assert_eq!(transition.effects, vec![DialogueEffect::StopVoice]);
    }

    #[test]
    fn test_events_ignored_when_idle() {
        let controller = controller();
        let transition = controller.transition(
            controller.initial_state(),
            DialogueEvent::Transcript("32".to_string()),
        );
        assert_eq!(transition.state.status, DialogueStatus::Idle);
        assert!(transition.effects.is_empty());
    }
}
