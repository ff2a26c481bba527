//! Chat session state machine
//!
//! Deterministic finite state machine for one interactive chat loop:
//! - Safety: a failed exchange always returns to `AwaitInput`
//! - Bounded recovery: `Retrying` can only be entered from `Unreachable`,
//!   and `Unreachable` only from `Dispatching`, so one exchange performs at
//!   most two requests
//! - Determinism: unique next state per event

use crate::errors::{ConsoleError, Result};
use serde::{Deserialize, Serialize};

/// Chat session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Loop not started yet
    Idle,

    /// Waiting for the next line of user input
    AwaitInput,

    /// First request in flight
    Dispatching,

    /// First request failed; the service is being started
    Unreachable,

    /// Single retry in flight
    Retrying,

    /// A response arrived and is being rendered
    Delivered,

    /// Both attempts failed; failure is being rendered
    Failed,

    /// Sentinel received (terminal)
    Exit,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Loop started
    Start,

    /// Blank input line
    EmptyInput,

    /// Exit sentinel entered
    Sentinel,

    /// Non-empty message submitted
    Submit,

    /// Request returned a response body
    RequestSucceeded,

    /// Request refused, timed out or returned nothing usable
    RequestFailed,

    /// Agent service spawned and the startup delay elapsed
    ServiceLaunched,

    /// Agent service could not be spawned
    LaunchFailed,

    /// Outcome shown to the user
    Rendered,
}

impl SessionState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Exit)
    }

    /// Attempt state transition with validation
    ///
    /// Valid transitions:
    /// 1.  Idle        → AwaitInput   (on: Start)
    /// 2.  AwaitInput  → AwaitInput   (on: EmptyInput)
    /// 3.  AwaitInput  → Exit         (on: Sentinel)
    /// 4.  AwaitInput  → Dispatching  (on: Submit)
    /// 5.  Dispatching → Delivered    (on: RequestSucceeded)
    /// 6.  Dispatching → Unreachable  (on: RequestFailed)
    /// 7.  Unreachable → Retrying     (on: ServiceLaunched)
    /// 8.  Unreachable → Failed       (on: LaunchFailed)
    /// 9.  Retrying    → Delivered    (on: RequestSucceeded)
    /// 10. Retrying    → Failed       (on: RequestFailed)
    /// 11. Delivered   → AwaitInput   (on: Rendered)
    /// 12. Failed      → AwaitInput   (on: Rendered)
    /// 13. Exit        → Exit         (terminal state)
    pub fn transition(&self, event: SessionEvent) -> Result<SessionState> {
        use SessionEvent::*;
        use SessionState::*;

        let next_state = match (self, event) {
            (Idle, Start) => AwaitInput,

            (AwaitInput, EmptyInput) => AwaitInput,
            (AwaitInput, Sentinel) => Exit,
            (AwaitInput, Submit) => Dispatching,

            (Dispatching, RequestSucceeded) => Delivered,
            (Dispatching, RequestFailed) => Unreachable,

            (Unreachable, ServiceLaunched) => Retrying,
            (Unreachable, LaunchFailed) => Failed,

            (Retrying, RequestSucceeded) => Delivered,
            (Retrying, RequestFailed) => Failed,

            (Delivered, Rendered) => AwaitInput,
            (Failed, Rendered) => AwaitInput,

            (Exit, _) => Exit,

            (from, event) => {
                return Err(ConsoleError::InvalidTransition {
                    from: format!("{:?}", from),
                    to: format!("(via {:?})", event),
                    reason: format!("No valid transition from {:?} on {:?}", from, event),
                });
            }
        };

        Ok(next_state)
    }

    /// Get all valid events from this state
    pub fn valid_events(&self) -> Vec<SessionEvent> {
        use SessionEvent::*;
        use SessionState::*;

        match self {
            Idle => vec![Start],
            AwaitInput => vec![EmptyInput, Sentinel, Submit],
            Dispatching => vec![RequestSucceeded, RequestFailed],
            Unreachable => vec![ServiceLaunched, LaunchFailed],
            Retrying => vec![RequestSucceeded, RequestFailed],
            Delivered | Failed => vec![Rendered],
            Exit => vec![],
        }
    }

    /// Whether a request is in flight in this state
    pub fn is_requesting(&self) -> bool {
        matches!(self, SessionState::Dispatching | SessionState::Retrying)
    }

    /// Human-readable state name
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::AwaitInput => "Waiting for input",
            SessionState::Dispatching => "Sending",
            SessionState::Unreachable => "Starting agent service",
            SessionState::Retrying => "Retrying",
            SessionState::Delivered => "Delivered",
            SessionState::Failed => "Failed",
            SessionState::Exit => "Exited",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = SessionState::Idle;
        for event in [
            SessionEvent::Start,
            SessionEvent::Submit,
            SessionEvent::RequestSucceeded,
            SessionEvent::Rendered,
        ] {
            state = state.transition(event).unwrap();
        }
        assert_eq!(state, SessionState::AwaitInput);
    }

    #[test]
    fn test_recovery_path() {
        let mut state = SessionState::AwaitInput;
        for event in [
            SessionEvent::Submit,
            SessionEvent::RequestFailed,
            SessionEvent::ServiceLaunched,
            SessionEvent::RequestFailed,
        ] {
            state = state.transition(event).unwrap();
        }
        assert_eq!(state, SessionState::Failed);
        assert_eq!(
            state.transition(SessionEvent::Rendered).unwrap(),
            SessionState::AwaitInput
        );
    }

    #[test]
    fn test_no_second_retry() {
        // A failed retry lands in Failed, which cannot launch again
        assert!(SessionState::Failed
            .transition(SessionEvent::ServiceLaunched)
            .is_err());
        assert!(SessionState::Retrying
            .transition(SessionEvent::ServiceLaunched)
            .is_err());
        assert!(SessionState::Unreachable
            .transition(SessionEvent::RequestFailed)
            .is_err());
    }

    #[test]
    fn test_sentinel_and_empty_input() {
        assert_eq!(
            SessionState::AwaitInput
                .transition(SessionEvent::EmptyInput)
                .unwrap(),
            SessionState::AwaitInput
        );
        assert_eq!(
            SessionState::AwaitInput
                .transition(SessionEvent::Sentinel)
                .unwrap(),
            SessionState::Exit
        );
    }

    #[test]
    fn test_terminal_state() {
        assert!(SessionState::Exit.is_terminal());
        assert!(!SessionState::Failed.is_terminal());
        assert_eq!(
            SessionState::Exit.transition(SessionEvent::Submit).unwrap(),
            SessionState::Exit
        );
    }

    #[test]
    fn test_valid_events_match_transition_table() {
        for state in [
            SessionState::Idle,
            SessionState::AwaitInput,
            SessionState::Dispatching,
            SessionState::Unreachable,
            SessionState::Retrying,
            SessionState::Delivered,
            SessionState::Failed,
        ] {
            for event in state.valid_events() {
                assert!(state.transition(event).is_ok(), "{:?} on {:?}", state, event);
            }
        }
    }
}
