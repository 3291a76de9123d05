//! Processor state machine and per-batch attempt records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a [`ResilientProcessor`](crate::ResilientProcessor)
///
/// ```text
/// Idle -> Running -> Checkpointing -> Running -> ... -> Completed
///            |  ^
///            v  |
///          Retrying -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorState {
    /// No run in progress
    Idle,
    /// Chunking a batch
    Running,
    /// Persisting progress after a successful batch
    Checkpointing,
    /// Re-running a batch after a transient failure
    Retrying,
    /// Stopped on a terminal error
    Failed,
    /// Entire input consumed
    Completed,
}

impl ProcessorState {
    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(self, next: ProcessorState) -> bool {
        use ProcessorState::*;
        matches!(
            (self, next),
            (Idle | Failed | Completed, Running)
                | (Running, Checkpointing | Retrying | Failed | Completed)
                | (Checkpointing, Running | Completed | Failed)
                | (Retrying, Running | Retrying | Failed)
        )
    }

    /// Whether the run has ended
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessorState::Failed | ProcessorState::Completed)
    }
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessorState::Idle => "idle",
            ProcessorState::Running => "running",
            ProcessorState::Checkpointing => "checkpointing",
            ProcessorState::Retrying => "retrying",
            ProcessorState::Failed => "failed",
            ProcessorState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Record of the attempts made on one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingAttempt {
    /// Input offset of the batch
    pub offset: usize,
    /// Failed attempts so far
    pub failures: u32,
    /// Message of the most recent failure
    pub last_error: Option<String>,
}

impl ProcessingAttempt {
    /// Fresh record for the batch at `offset`
    pub fn new(offset: usize) -> Self {
        Self {
            offset,
            failures: 0,
            last_error: None,
        }
    }

    /// Register a failure; returns the retry number about to be made
    pub fn record_failure(&mut self, error: &impl fmt::Display) -> u32 {
        self.failures += 1;
        self.last_error = Some(error.to_string());
        self.failures
    }

    /// Whether another retry would exceed `limit`
    pub fn exhausted(&self, limit: u32) -> bool {
        self.failures > limit
    }

    /// Attempts started, counting the one in progress
    pub fn attempts(&self) -> u32 {
        self.failures + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use ProcessorState::*;
        assert!(Idle.can_transition_to(Running));
        assert!(Running.can_transition_to(Checkpointing));
        assert!(Running.can_transition_to(Retrying));
        assert!(Retrying.can_transition_to(Failed));
        assert!(Checkpointing.can_transition_to(Completed));
        assert!(!Idle.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Retrying));
        assert!(Failed.is_terminal());
        assert!(!Retrying.is_terminal());
    }

    #[test]
    fn test_attempt_exhaustion() {
        let mut attempt = ProcessingAttempt::new(64);
        assert_eq!(attempt.attempts(), 1);
        for expected in 1..=2 {
            assert_eq!(attempt.record_failure(&"boom"), expected);
            assert!(!attempt.exhausted(2));
        }
        attempt.record_failure(&"boom again");
        assert!(attempt.exhausted(2));
        assert_eq!(attempt.attempts(), 4);
        assert_eq!(attempt.last_error.as_deref(), Some("boom again"));
    }
}
