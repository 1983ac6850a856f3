use std::fmt;
use std::fmt::Formatter;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::errors::ActionError;

/// Phases of one submission attempt. `Idle` is both the initial state and
/// the state re-entered after either terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Submitting,
    Confirming,
    Settled,
    Failed,
}

impl fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionPhase::Idle => "Idle",
            SubmissionPhase::Submitting => "Submitting",
            SubmissionPhase::Confirming => "Confirming",
            SubmissionPhase::Settled => "Settled",
            SubmissionPhase::Failed => "Failed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionEvent {
    SubmitRequested,
    Broadcasted,
    Confirmed,
    Errored,
    Reset,
}

impl fmt::Display for SubmissionEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionEvent::SubmitRequested => "SubmitRequested",
            SubmissionEvent::Broadcasted => "Broadcasted",
            SubmissionEvent::Confirmed => "Confirmed",
            SubmissionEvent::Errored => "Errored",
            SubmissionEvent::Reset => "Reset",
        };
        write!(f, "{}", s)
    }
}

/// One observed phase change, handed to whoever emits notifications. The
/// machine itself performs no side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub attempt_id: String,
    pub from: SubmissionPhase,
    pub to: SubmissionPhase,
    pub event: SubmissionEvent,
    pub at: DateTime<Utc>,
}

/// Pure state machine for a single attempt. Each attempt gets a fresh
/// machine; nothing persists across attempts.
#[derive(Debug, Clone)]
pub struct SubmissionMachine {
    attempt_id: String,
    phase: SubmissionPhase,
}

impl SubmissionMachine {
    pub fn new(attempt_id: String) -> Self {
        Self {
            attempt_id,
            phase: SubmissionPhase::Idle,
        }
    }

    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn advance(&mut self, event: SubmissionEvent) -> Result<Transition, ActionError> {
        let to = match (self.phase, event) {
            (SubmissionPhase::Idle, SubmissionEvent::SubmitRequested) => SubmissionPhase::Submitting,
            (SubmissionPhase::Submitting, SubmissionEvent::Broadcasted) => SubmissionPhase::Confirming,
            (SubmissionPhase::Confirming, SubmissionEvent::Confirmed) => SubmissionPhase::Settled,
            (SubmissionPhase::Submitting, SubmissionEvent::Errored)
            | (SubmissionPhase::Confirming, SubmissionEvent::Errored) => SubmissionPhase::Failed,
            (SubmissionPhase::Settled, SubmissionEvent::Reset)
            | (SubmissionPhase::Failed, SubmissionEvent::Reset) => SubmissionPhase::Idle,
            (phase, event) => {
                return Err(ActionError::InvalidStateTransition {
                    event: event.to_string(),
                    phase: phase.to_string(),
                })
            }
        };

        let transition = Transition {
            attempt_id: self.attempt_id.clone(),
            from: self.phase,
            to,
            event,
            at: Utc::now(),
        };
        self.phase = to;
        Ok(transition)
    }
}
