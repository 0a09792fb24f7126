//! Async driver for the intake dialogue
//!
//! The runner feeds [`DialogueEvent`]s into the controller and works through
//! the returned effects one at a time: speak, then listen, never both.
//! Every suspension point races against the cancellation signal so a
//! [`DialogueHandle::cancel`] from another task stops the voice and returns
//! the slot to idle.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use error_common::{log_error, ErrorContext};
use logger_redacted::redact_transcript;
use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::collaborators::{PredictionOutcome, PredictionService};
use crate::dialogue::{
    AbortReason, DialogueController, DialogueEffect, DialogueEvent, DialogueState,
};
use crate::error::{IntakeError, IntakeResult};
use crate::record::IntakeRecord;
use crate::session::{IntakeSession, SessionStatus};
use crate::slot::{ConversationSlot, SlotState};
use crate::triage::Recommendations;
use crate::voice::VoiceIo;

/// How a dialogue run ended
#[derive(Debug, Clone)]
pub enum IntakeOutcome {
    Predicted {
        session: IntakeSession,
        record: IntakeRecord,
        prediction: PredictionOutcome,
        recommendations: Recommendations,
    },
    Cancelled {
        session: IntakeSession,
    },
}

impl IntakeOutcome {
    pub fn session(&self) -> &IntakeSession {
        match self {
            IntakeOutcome::Predicted { session, .. } | IntakeOutcome::Cancelled { session } => {
                session
            }
        }
    }
}

/// Cancels a running dialogue or chat from another task
#[derive(Debug, Clone)]
pub struct DialogueHandle {
    cancel: Arc<watch::Sender<bool>>,
    slot: ConversationSlot,
}

impl DialogueHandle {
    pub(crate) fn new(slot: ConversationSlot) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            cancel: Arc::new(cancel),
            slot,
        }
    }

    /// Force-stop whatever is in flight; the run resets to idle.
    /// Has no effect on a run started afterwards.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn slot_state(&self) -> SlotState {
        self.slot.state()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.cancel.subscribe()
    }

    /// Drop any pending cancel request
    pub(crate) fn clear(&self) {
        self.cancel.send_replace(false);
    }
}

/// Resolves once cancellation has been requested
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            // sender gone: nobody can cancel any more
            std::future::pending::<()>().await;
        }
    }
}

/// Run `future` unless cancellation wins the race
pub(crate) async fn unless_cancelled<F: Future>(
    future: F,
    cancel: &mut watch::Receiver<bool>,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancelled(cancel) => None,
        output = future => Some(output),
    }
}

/// Speak on the slot. `None` when cancelled; synthesis failures are logged
/// and the dialogue carries on.
pub(crate) async fn speak_on_slot(
    voice: &dyn VoiceIo,
    slot: &ConversationSlot,
    text: &str,
    cancel: &mut watch::Receiver<bool>,
) -> IntakeResult<Option<()>> {
    let guard = slot.acquire(SlotState::Speaking)?;
    debug!(text, "speaking");
    let result = unless_cancelled(voice.speak(text), cancel).await;
    drop(guard);
    match result {
        None => Ok(None),
        Some(Ok(())) => Ok(Some(())),
        Some(Err(e)) => {
            warn!(error = %e, code = e.code(), "speech synthesis failed");
            Ok(Some(()))
        }
    }
}

/// Listen once on the slot, bounded by `timeout`. `None` when cancelled.
pub(crate) async fn listen_on_slot(
    voice: &dyn VoiceIo,
    slot: &ConversationSlot,
    timeout: Duration,
    cancel: &mut watch::Receiver<bool>,
) -> IntakeResult<Option<IntakeResult<String>>> {
    let guard = slot.acquire(SlotState::Listening)?;
    let result = unless_cancelled(tokio::time::timeout(timeout, voice.listen()), cancel).await;
    drop(guard);
    let heard = match result {
        None => return Ok(None),
        Some(Ok(heard)) => heard,
        Some(Err(_)) => {
            if let Err(e) = voice.stop().await {
                warn!(error = %e, "failed to stop recognition after timeout");
            }
            Err(IntakeError::Timeout(timeout.as_secs()))
        }
    };
    match &heard {
        Ok(transcript) => info!(transcript = %redact_transcript(transcript), "heard"),
        Err(e) => debug!(error = %e, "nothing recognised"),
    }
    Ok(Some(heard))
}

/// Drives one voice intake at a time
pub struct DialogueRunner {
    controller: DialogueController,
    voice: Arc<dyn VoiceIo>,
    prediction: Arc<dyn PredictionService>,
    slot: ConversationSlot,
    handle: DialogueHandle,
}

impl DialogueRunner {
    pub fn new(
        controller: DialogueController,
        voice: Arc<dyn VoiceIo>,
        prediction: Arc<dyn PredictionService>,
    ) -> Self {
        Self::with_slot(controller, voice, prediction, ConversationSlot::new())
    }

    /// Share `slot` with other voice features such as [`crate::VoiceChat`]
    pub fn with_slot(
        controller: DialogueController,
        voice: Arc<dyn VoiceIo>,
        prediction: Arc<dyn PredictionService>,
        slot: ConversationSlot,
    ) -> Self {
        let handle = DialogueHandle::new(slot.clone());
        Self {
            controller,
            voice,
            prediction,
            slot,
            handle,
        }
    }

    pub fn handle(&self) -> DialogueHandle {
        self.handle.clone()
    }

    pub fn controller(&self) -> &DialogueController {
        &self.controller
    }

    /// Run the dialogue to completion, prediction and narration included
    pub async fn run(&self) -> IntakeResult<IntakeOutcome> {
        self.handle.clear();
        let mut session = IntakeSession::new();
        let span = info_span!("intake", session_id = %session.id);

        let result = self.drive(&mut session).instrument(span).await;

        self.handle.clear();
        self.slot.reset();
        match &result {
            Ok(outcome) => {
                info!(session_id = %session.id, status = ?outcome.session().status, "intake finished")
            }
            Err(e) => {
                session.set_status(SessionStatus::Failed);
                let context = ErrorContext::new()
                    .with_session_id(session.id.to_string())
                    .add_context("operation", "intake");
                log_error(e.code(), e, &context);
            }
        }
        result
    }

    async fn drive(&self, session: &mut IntakeSession) -> IntakeResult<IntakeOutcome> {
        let mut cancel = self.handle.subscribe();
        info!("intake started");

        let mut state = DialogueState::default();
        let mut queue = VecDeque::new();
        self.step(&mut state, &mut queue, DialogueEvent::Start);

        while let Some(effect) = queue.pop_front() {
            match effect {
                DialogueEffect::Speak(text) => {
                    let spoken =
                        speak_on_slot(self.voice.as_ref(), &self.slot, &text, &mut cancel).await?;
                    if spoken.is_none() {
                        return self.finish_cancelled(state, session).await;
                    }
                }
                DialogueEffect::Listen => {
                    let timeout = self.controller.config().listen_timeout();
                    let heard =
                        listen_on_slot(self.voice.as_ref(), &self.slot, timeout, &mut cancel)
                            .await?;
                    let event = match heard {
                        None => return self.finish_cancelled(state, session).await,
                        Some(Ok(transcript)) => DialogueEvent::Transcript(transcript),
                        Some(Err(e)) => DialogueEvent::RecognitionFailed(e.to_string()),
                    };
                    self.step(&mut state, &mut queue, event);
                }
                DialogueEffect::Submit(record) => {
                    return self.submit(record, session, &mut cancel).await;
                }
                DialogueEffect::StopVoice => self.stop_voice().await,
                DialogueEffect::Abort(AbortReason::RetriesExhausted(failures)) => {
                    return Err(IntakeError::RetriesExhausted(failures));
                }
                DialogueEffect::Abort(AbortReason::InvalidRecord(reason)) => {
                    return Err(IntakeError::Validation(reason));
                }
            }
        }

        Err(IntakeError::Validation(
            "dialogue stopped without submitting".to_string(),
        ))
    }

    fn step(
        &self,
        state: &mut DialogueState,
        queue: &mut VecDeque<DialogueEffect>,
        event: DialogueEvent,
    ) {
        let transition = self
            .controller
            .transition(std::mem::take(state), event);
        debug!(status = ?transition.state.status, effects = transition.effects.len(), "transition");
        *state = transition.state;
        queue.extend(transition.effects);
    }

    async fn submit(
        &self,
        record: IntakeRecord,
        session: &mut IntakeSession,
        cancel: &mut watch::Receiver<bool>,
    ) -> IntakeResult<IntakeOutcome> {
        info!(
            age = record.age,
            gender = %record.gender,
            region = %record.region,
            symptoms = record.symptoms.len(),
            "submitting intake record"
        );
        let prediction = match unless_cancelled(self.prediction.predict(&record), cancel).await {
            None => return self.finish_cancelled(DialogueState::default(), session).await,
            Some(prediction) => prediction?,
        };

        let recommendations = prediction.recommendations(&record);
        info!(
            disease = %prediction.predicted_disease,
            urgency = %recommendations.urgency,
            advice = recommendations.demographic.len(),
            "prediction ready"
        );

        // the record is already submitted; cancelling here only cuts the narration short
        let narration = prediction.narration(&recommendations);
        if speak_on_slot(self.voice.as_ref(), &self.slot, &narration, cancel)
            .await?
            .is_none()
        {
            self.stop_voice().await;
        }

        session.set_status(SessionStatus::Completed);
        Ok(IntakeOutcome::Predicted {
            session: session.clone(),
            record,
            prediction,
            recommendations,
        })
    }

    async fn finish_cancelled(
        &self,
        state: DialogueState,
        session: &mut IntakeSession,
    ) -> IntakeResult<IntakeOutcome> {
        let transition = self.controller.transition(state, DialogueEvent::Cancel);
        for effect in transition.effects {
            if effect == DialogueEffect::StopVoice {
                self.stop_voice().await;
            }
        }
        info!("intake cancelled");
        session.set_status(SessionStatus::Cancelled);
        Ok(IntakeOutcome::Cancelled {
            session: session.clone(),
        })
    }

    async fn stop_voice(&self) {
        if let Err(e) = self.voice.stop().await {
            warn!(error = %e, "failed to stop voice");
        }
        self.slot.reset();
    }
}
