//! Recording lifecycle state machine

use std::fmt;
use thiserror::Error;

/// Recorder states
///
/// `Paused` is part of the recorder vocabulary but no transition reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordingState {
    #[default]
    Inactive,
    Recording,
    Paused,
}

impl RecordingState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Recording => "recording",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: RecordingState,
    pub action: &'static str,
}

/// Lifecycle entity guarding start/stop ordering.
///
/// State machine:
///   INACTIVE -> RECORDING (start)
///   RECORDING | PAUSED -> INACTIVE (stop)
#[derive(Debug, Clone, Copy, Default)]
pub struct Lifecycle {
    state: RecordingState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: RecordingState::Inactive,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_inactive(&self) -> bool {
        self.state == RecordingState::Inactive
    }

    /// Transition from INACTIVE to RECORDING
    pub fn start(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != RecordingState::Inactive {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "start",
            });
        }
        self.state = RecordingState::Recording;
        Ok(())
    }

    /// Transition from any non-inactive state to INACTIVE
    pub fn stop(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state == RecordingState::Inactive {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "stop",
            });
        }
        self.state = RecordingState::Inactive;
        Ok(())
    }

    /// Force INACTIVE after a session could not be wired
    pub fn reset(&mut self) {
        self.state = RecordingState::Inactive;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lifecycle_is_inactive() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.is_inactive());
        assert_eq!(lifecycle.state(), RecordingState::Inactive);
    }

    #[test]
    fn start_from_inactive() {
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.start().is_ok());
        assert_eq!(lifecycle.state(), RecordingState::Recording);
    }

    #[test]
    fn start_twice_fails() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.start().unwrap();

        let err = lifecycle.start().unwrap_err();
        assert_eq!(err.current_state, RecordingState::Recording);
        assert_eq!(err.action, "start");
    }

    #[test]
    fn stop_from_inactive_fails() {
        let mut lifecycle = Lifecycle::new();

        let err = lifecycle.stop().unwrap_err();
        assert_eq!(err.current_state, RecordingState::Inactive);
        assert_eq!(lifecycle.state(), RecordingState::Inactive);
    }

    #[test]
    fn stop_from_paused() {
        let mut lifecycle = Lifecycle {
            state: RecordingState::Paused,
        };
        assert!(lifecycle.stop().is_ok());
        assert!(lifecycle.is_inactive());
    }

    #[test]
    fn full_cycle_allows_restart() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.start().unwrap();
        lifecycle.stop().unwrap();
        lifecycle.start().unwrap();
        assert_eq!(lifecycle.state(), RecordingState::Recording);
    }

    #[test]
    fn reset_returns_to_inactive() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.start().unwrap();
        lifecycle.reset();
        assert!(lifecycle.is_inactive());
    }

    #[test]
    fn state_display() {
        assert_eq!(RecordingState::Inactive.to_string(), "inactive");
        assert_eq!(RecordingState::Recording.to_string(), "recording");
        assert_eq!(RecordingState::Paused.to_string(), "paused");
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: RecordingState::Inactive,
            action: "stop",
        };
        let msg = err.to_string();
        assert!(msg.contains("stop"));
        assert!(msg.contains("inactive"));
    }
}
