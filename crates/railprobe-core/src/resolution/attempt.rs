use crate::locator::LocatorCandidate;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Found,
    /// Matched an element that never became visible in the window.
    NotVisible,
    /// Nothing matched in the window.
    Timeout,
    /// The driver reported an error for this candidate.
    Error(String),
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Found => write!(f, "found"),
            AttemptOutcome::NotVisible => write!(f, "not visible"),
            AttemptOutcome::Timeout => write!(f, "timeout"),
            AttemptOutcome::Error(e) => write!(f, "error: {}", e),
        }
    }
}

/// Which part of a resolution an attempt belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    Static,
    /// Looking for the discovery trigger.
    Trigger,
    /// Re-scan after the trigger was clicked.
    Rescan,
}

impl AttemptPhase {
    pub fn name(&self) -> &'static str {
        match self {
            AttemptPhase::Static => "static",
            AttemptPhase::Trigger => "trigger",
            AttemptPhase::Rescan => "rescan",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolutionAttempt {
    pub candidate: LocatorCandidate,
    pub phase: AttemptPhase,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
}

impl fmt::Display for ResolutionAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) -> {} in {:?}",
            self.phase.name(),
            self.candidate,
            self.candidate.kind().name(),
            self.outcome,
            self.elapsed
        )
    }
}
