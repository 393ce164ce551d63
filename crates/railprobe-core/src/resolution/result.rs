use super::attempt::{AttemptOutcome, AttemptPhase, ResolutionAttempt};
use crate::backend::ElementHandle;
use crate::locator::LocatorCandidate;
use std::fmt;
use thiserror::Error;

/// A located, visible element together with how it was found.
///
/// The handle dies with the current document; resolve again after navigating.
#[derive(Debug, Clone)]
pub struct ResolvedElement {
    pub target: String,
    pub handle: ElementHandle,
    pub candidate: LocatorCandidate,
    pub phase: AttemptPhase,
    pub attempts: Vec<ResolutionAttempt>,
}

impl ResolvedElement {
    pub fn used_discovery(&self) -> bool {
        self.phase == AttemptPhase::Rescan
    }

    pub fn failed_attempts(&self) -> impl Iterator<Item = &ResolutionAttempt> {
        self.attempts
            .iter()
            .filter(|a| a.outcome != AttemptOutcome::Found)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    NotVisible,
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::NotVisible => write!(f, "not visible"),
            FailureKind::Timeout => write!(f, "timeout"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("could not resolve '{target}': {kind} after {} attempt(s)", .attempts.len())]
pub struct ResolutionFailure {
    pub target: String,
    pub kind: FailureKind,
    pub attempts: Vec<ResolutionAttempt>,
}

impl ResolutionFailure {
    /// One line per attempted candidate, for reports.
    pub fn diagnostics(&self) -> String {
        let mut out = self.to_string();
        for attempt in &self.attempts {
            out.push_str("\n  ");
            out.push_str(&attempt.to_string());
        }
        out
    }
}
