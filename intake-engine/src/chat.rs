//! Spoken Q&A against the chatbot collaborator
//!
//! Listen for a question, ask the chatbot, speak the answer, repeat until an
//! exit keyword is heard. Each question stands alone.

use std::sync::Arc;

use error_common::{log_error, ErrorContext};
use tracing::{info, info_span, warn, Instrument};

use crate::collaborators::ChatbotService;
use crate::config::DialogueConfig;
use crate::error::{IntakeError, IntakeResult};
use crate::runner::{listen_on_slot, speak_on_slot, unless_cancelled, DialogueHandle};
use crate::session::{IntakeSession, SessionStatus};
use crate::slot::ConversationSlot;
use crate::utterance::{clean_answer, is_keyword};
use crate::voice::VoiceIo;

pub const CHAT_GREETING: &str = "Ask me a health question. Say goodbye when you are done.";
pub const CHAT_FAREWELL: &str = "Goodbye. Take care.";
pub const CHAT_APOLOGY: &str =
    "Sorry, I could not get an answer right now. Please ask again.";

#[derive(Debug, Clone)]
pub struct ChatSummary {
    pub session: IntakeSession,
    pub questions_answered: usize,
}

pub struct VoiceChat {
    voice: Arc<dyn VoiceIo>,
    chatbot: Arc<dyn ChatbotService>,
    slot: ConversationSlot,
    handle: DialogueHandle,
    config: DialogueConfig,
}

impl VoiceChat {
    pub fn new(
        voice: Arc<dyn VoiceIo>,
        chatbot: Arc<dyn ChatbotService>,
        config: DialogueConfig,
    ) -> Self {
        Self::with_slot(voice, chatbot, config, ConversationSlot::new())
    }

    pub fn with_slot(
        voice: Arc<dyn VoiceIo>,
        chatbot: Arc<dyn ChatbotService>,
        config: DialogueConfig,
        slot: ConversationSlot,
    ) -> Self {
        let handle = DialogueHandle::new(slot.clone());
        Self {
            voice,
            chatbot,
            slot,
            handle,
            config,
        }
    }

    pub fn handle(&self) -> DialogueHandle {
        self.handle.clone()
    }

    /// Ask one question; a failed call becomes a spoken apology
    pub async fn answer(&self, question: &str) -> String {
        match self.chatbot.ask(question).await {
            Ok(answer) if !answer.trim().is_empty() => answer,
            Ok(_) => CHAT_APOLOGY.to_string(),
            Err(e) => {
                warn!(error = %e, code = e.code(), "chatbot call failed");
                CHAT_APOLOGY.to_string()
            }
        }
    }

    pub async fn run(&self) -> IntakeResult<ChatSummary> {
        self.handle.clear();
        let mut session = IntakeSession::new();
        let span = info_span!("chat", session_id = %session.id);

        let result = self.converse().instrument(span).await;

        self.handle.clear();
        self.slot.reset();
        match result {
            Ok((status, questions_answered)) => {
                session.set_status(status);
                info!(session_id = %session.id, questions_answered, "chat finished");
                Ok(ChatSummary {
                    session,
                    questions_answered,
                })
            }
            Err(e) => {
                let context = ErrorContext::new()
                    .with_session_id(session.id.to_string())
                    .add_context("operation", "chat");
                log_error(e.code(), &e, &context);
                Err(e)
            }
        }
    }

    async fn converse(&self) -> IntakeResult<(SessionStatus, usize)> {
        let mut cancel = self.handle.subscribe();
        let voice = self.voice.as_ref();
        let mut answered = 0;
        let mut failures = 0;

        if speak_on_slot(voice, &self.slot, CHAT_GREETING, &mut cancel)
            .await?
            .is_none()
        {
            return self.cancelled(answered).await;
        }

        loop {
            let heard = listen_on_slot(
                voice,
                &self.slot,
                self.config.listen_timeout(),
                &mut cancel,
            )
            .await?;
            let question = match heard {
                None => return self.cancelled(answered).await,
                Some(Ok(question)) => question,
                Some(Err(e)) => {
                    failures += 1;
                    if failures > self.config.max_recognition_retries {
                        return Err(IntakeError::RetriesExhausted(failures));
                    }
                    warn!(error = %e, failures, "no question heard");
                    continue;
                }
            };

            let question = clean_answer(&question);
            if question.is_empty() {
                continue;
            }
            failures = 0;

            if is_keyword(question, &self.config.chat_exit_keywords) {
                if speak_on_slot(voice, &self.slot, CHAT_FAREWELL, &mut cancel)
                    .await?
                    .is_none()
                {
                    return self.cancelled(answered).await;
                }
                return Ok((SessionStatus::Completed, answered));
            }

            let answer = match unless_cancelled(self.answer(question), &mut cancel)
                .await
            {
                None => return self.cancelled(answered).await,
                Some(answer) => answer,
            };
            answered += 1;

            if speak_on_slot(voice, &self.slot, &answer, &mut cancel)
                .await?
                .is_none()
            {
                return self.cancelled(answered).await;
            }
        }
    }

    async fn cancelled(&self, answered: usize) -> IntakeResult<(SessionStatus, usize)> {
        if let Err(e) = self.voice.stop().await {
            warn!(error = %e, "failed to stop voice");
        }
        self.slot.reset();
        info!("chat cancelled");
        Ok((SessionStatus::Cancelled, answered))
    }
}
