use std::fmt;

use lcr_types::LedgerHeaderRecord;

use crate::error::ReplayError;

/// Lifecycle of a replay as seen by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkState {
    /// Reset but not stepped yet.
    Pending,
    Running,
    Success,
    Failure,
}

impl WorkState {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

impl fmt::Display for WorkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "succeeded",
            Self::Failure => "failed",
        };
        f.write_str(text)
    }
}

/// Result of a single step.
#[derive(Debug)]
pub enum StepState {
    /// More steps are needed.
    Running,
    /// The LCL reached the end of the range.
    Success,
    /// The replay stopped on a terminal error. It is never retried here.
    Failure(ReplayError),
}

impl StepState {
    pub fn work_state(&self) -> WorkState {
        match self {
            Self::Running => WorkState::Running,
            Self::Success => WorkState::Success,
            Self::Failure(_) => WorkState::Failure,
        }
    }
}

/// What a step hands back to the scheduler.
#[derive(Debug)]
pub struct StepReport {
    pub state: StepState,
    /// The most recent ledger this replay applied, or the starting LCL if it
    /// has not applied one yet.
    pub last_applied: LedgerHeaderRecord,
}

impl StepReport {
    pub fn is_running(&self) -> bool {
        matches!(self.state, StepState::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.state, StepState::Success)
    }

    /// The terminal error, if the step failed.
    pub fn failure(&self) -> Option<&ReplayError> {
        match &self.state {
            StepState::Failure(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_states() {
        assert_eq!(WorkState::Pending.to_string(), "pending");
        assert_eq!(WorkState::Success.to_string(), "succeeded");
        assert_eq!(WorkState::Failure.to_string(), "failed");
        assert!(WorkState::Failure.is_done());
        assert!(!WorkState::Running.is_done());
    }

    #[test]
    fn step_state_maps_to_work_state() {
        assert_eq!(StepState::Running.work_state(), WorkState::Running);
        assert_eq!(
            StepState::Failure(ReplayError::AlreadyFailed).work_state(),
            WorkState::Failure
        );
    }
}
