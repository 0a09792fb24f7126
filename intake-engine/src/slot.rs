use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::{IntakeError, IntakeResult};

/// What the single conversation slot is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Idle,
    Speaking,
    Listening,
}

impl SlotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotState::Idle => "idle",
            SlotState::Speaking => "speaking",
            SlotState::Listening => "listening",
        }
    }
}

/// Speaking and listening share one slot; at most one is active.
///
/// Clones share the same slot.
#[derive(Debug, Clone)]
pub struct ConversationSlot {
    state: Arc<Mutex<SlotState>>,
}

impl Default for ConversationSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationSlot {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SlotState::Idle)),
        }
    }

    pub fn state(&self) -> SlotState {
        *self.state.lock()
    }

    pub fn is_idle(&self) -> bool {
        self.state() == SlotState::Idle
    }

    /// Claim the slot for `activity`. Fails while another activity holds it.
    pub fn acquire(&self, activity: SlotState) -> IntakeResult<SlotGuard> {
        if activity == SlotState::Idle {
            return Err(IntakeError::Validation(
                "cannot acquire the conversation slot for idle".to_string(),
            ));
        }
        let mut state = self.state.lock();
        if *state != SlotState::Idle {
            return Err(IntakeError::SlotBusy {
                requested: activity.as_str(),
                active: state.as_str(),
            });
        }
        *state = activity;
        debug!(activity = activity.as_str(), "slot acquired");
        Ok(SlotGuard {
            slot: self.clone(),
            activity,
        })
    }

    /// Force the slot back to idle regardless of holder
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if *state != SlotState::Idle {
            debug!(activity = state.as_str(), "slot reset");
        }
        *state = SlotState::Idle;
    }
}

/// Holds the slot until dropped
#[derive(Debug)]
pub struct SlotGuard {
    slot: ConversationSlot,
    activity: SlotState,
}

impl SlotGuard {
    pub fn activity(&self) -> SlotState {
        self.activity
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut state = self.slot.state.lock();
        // a reset may already have handed the slot to someone else
        if *state == self.activity {
            *state = SlotState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_while_speaking_is_refused() {
        let slot = ConversationSlot::new();
        let speaking = slot.acquire(SlotState::Speaking).unwrap();
        let err = slot.acquire(SlotState::Listening).unwrap_err();
        assert!(matches!(
            err,
            IntakeError::SlotBusy {
                requested: "listening",
                active: "speaking"
            }
        ));
        drop(speaking);
        assert!(slot.is_idle());
        assert!(slot.acquire(SlotState::Listening).is_ok());
    }

    #[test]
    fn test_reset_frees_slot() {
        let slot = ConversationSlot::new();
        let guard = slot.acquire(SlotState::Listening).unwrap();
        slot.reset();
        let speaking = slot.acquire(SlotState::Speaking).unwrap();
        drop(guard);
        assert_eq!(slot.state(), SlotState::Speaking);
        drop(speaking);
        assert!(slot.is_idle());
    }

    #[test]
    fn test_idle_is_not_an_activity() {
        let slot = ConversationSlot::new();
        assert!(slot.acquire(SlotState::Idle).is_err());
    }
}
