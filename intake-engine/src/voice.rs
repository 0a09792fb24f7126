//! Voice I/O seam
//!
//! Speech synthesis and recognition are platform concerns. The engine only
//! sees [`VoiceIo`]: `speak` resolves once the utterance has finished, and
//! `listen` resolves with one final transcript per call.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

#[cfg(test)]
use mockall::automock;

use crate::error::{IntakeError, IntakeResult};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait VoiceIo: Send + Sync {
    /// Say `text`; returns after playback has ended
    async fn speak(&self, text: &str) -> IntakeResult<()>;

    /// Capture one utterance and return its final transcript
    async fn listen(&self) -> IntakeResult<String>;

    /// Abort any in-flight speak or listen
    async fn stop(&self) -> IntakeResult<()>;
}

/// Canned reply for [`ScriptedVoice`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    Heard(String),
    Failed(String),
    /// Never answers; exercises the listen timeout
    Silence,
}

impl From<&str> for ScriptedReply {
    fn from(text: &str) -> Self {
        ScriptedReply::Heard(text.to_string())
    }
}

impl From<String> for ScriptedReply {
    fn from(text: String) -> Self {
        ScriptedReply::Heard(text)
    }
}

/// Replays a fixed list of transcripts and records what was spoken
#[derive(Debug, Default)]
pub struct ScriptedVoice {
    replies: Mutex<VecDeque<ScriptedReply>>,
    spoken: Mutex<Vec<String>>,
    stops: Mutex<usize>,
}

impl ScriptedVoice {
    pub fn new<I, R>(replies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ScriptedReply>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            spoken: Mutex::new(Vec::new()),
            stops: Mutex::new(0),
        }
    }

    /// Everything spoken so far, in order
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }

    pub fn stop_count(&self) -> usize {
        *self.stops.lock()
    }
}

#[async_trait]
impl VoiceIo for ScriptedVoice {
    async fn speak(&self, text: &str) -> IntakeResult<()> {
        self.spoken.lock().push(text.to_string());
        Ok(())
    }

    async fn listen(&self) -> IntakeResult<String> {
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(ScriptedReply::Heard(text)) => Ok(text),
            Some(ScriptedReply::Failed(reason)) => Err(IntakeError::Recognition(reason)),
            Some(ScriptedReply::Silence) => std::future::pending().await,
            None => Err(IntakeError::Recognition("script exhausted".to_string())),
        }
    }

    async fn stop(&self) -> IntakeResult<()> {
        *self.stops.lock() += 1;
        Ok(())
    }
}
