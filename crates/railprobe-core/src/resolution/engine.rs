//! Resilient element resolution.
//!
//! Candidates are tried strictly in order. Each gets a bounded window in which
//! the page is re-queried until a visible match appears; the first visible
//! match wins and later candidates are never consulted. When every static
//! candidate fails, an optional discovery step clicks a trigger and re-scans a
//! narrower candidate list. The whole call never outlives `overall_timeout`.

use super::attempt::{AttemptOutcome, AttemptPhase, ResolutionAttempt};
use super::result::{FailureKind, ResolutionFailure, ResolvedElement};
use super::target::{Discovery, Target};
use crate::backend::{DriverError, ElementHandle, PageDriver};
use crate::interact;
use crate::locator::LocatorCandidate;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    pub per_attempt_timeout: Duration,
    pub overall_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            per_attempt_timeout: Duration::from_millis(2000),
            overall_timeout: Duration::from_millis(15000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ResolveOptions {
    /// Widen `overall_timeout` so `windows` full per-attempt windows plus
    /// `extra` fit inside it. Never shrinks it.
    pub fn covering(self, windows: usize, extra: Duration) -> Self {
        let windows = u32::try_from(windows).unwrap_or(u32::MAX);
        let needed = self
            .per_attempt_timeout
            .saturating_mul(windows)
            .saturating_add(extra);
        Self {
            overall_timeout: self.overall_timeout.max(needed),
            ..self
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: ResolveOptions,
}

/// Per-call bookkeeping. Discarded when the call returns.
struct Session {
    deadline: Instant,
    attempts: Vec<ResolutionAttempt>,
    cut_short: bool,
}

impl Session {
    fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

impl Resolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Copy whose overall cap leaves a full window for every candidate
    /// `target` can try, discovery trigger, settle and rescan included.
    pub fn sized_for(&self, target: &Target) -> Resolver {
        let options = match &target.discovery {
            None => self.options.covering(target.candidates.len(), Duration::ZERO),
            // One more window for the trigger click itself.
            Some(d) => self.options.covering(
                target.candidates.len() + d.trigger.len() + d.rescan.len() + 1,
                d.settle,
            ),
        };
        Resolver::new(options)
    }

    /// Resolve a target, applying its requirement policy.
    ///
    /// Optional targets degrade to `Ok(None)` with a warning; mandatory
    /// targets return the failure with its attempt diagnostics.
    pub async fn resolve_target<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        target: &Target,
    ) -> Result<Option<ResolvedElement>, ResolutionFailure> {
        match self
            .resolve(
                driver,
                &target.name,
                &target.candidates,
                target.discovery.as_ref(),
            )
            .await
        {
            Ok(resolved) => Ok(Some(resolved)),
            Err(failure) if !target.is_mandatory() => {
                warn!("Optional target skipped: {}", failure.diagnostics());
                Ok(None)
            }
            Err(failure) => Err(failure),
        }
    }

    pub async fn resolve<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        target: &str,
        candidates: &[LocatorCandidate],
        discovery: Option<&Discovery>,
    ) -> Result<ResolvedElement, ResolutionFailure> {
        debug!(
            "Resolving '{}' with {} candidate(s)",
            target,
            candidates.len()
        );
        let mut session = Session {
            deadline: Instant::now() + self.options.overall_timeout,
            attempts: Vec::new(),
            cut_short: false,
        };

        if let Some((handle, candidate)) = self
            .scan(driver, candidates, AttemptPhase::Static, &mut session)
            .await
        {
            return Ok(self.resolved(target, handle, candidate, AttemptPhase::Static, session));
        }

        if let Some(discovery) = discovery.filter(|_| !session.cut_short) {
            info!(
                "Static candidates exhausted for '{}', trying discovery trigger",
                target
            );
            if let Some(found) = self.discover(driver, target, discovery, &mut session).await {
                let (handle, candidate) = found;
                return Ok(self.resolved(target, handle, candidate, AttemptPhase::Rescan, session));
            }
        }

        let kind = if session.cut_short {
            FailureKind::Timeout
        } else if session
            .attempts
            .iter()
            .any(|a| a.outcome == AttemptOutcome::NotVisible)
        {
            FailureKind::NotVisible
        } else {
            FailureKind::NotFound
        };

        Err(ResolutionFailure {
            target: target.to_string(),
            kind,
            attempts: session.attempts,
        })
    }

    /// First visible candidate within the per-attempt window, or `None`.
    ///
    /// Used for probes where absence is an answer rather than a failure.
    pub async fn find_visible<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        target: &str,
        candidates: &[LocatorCandidate],
    ) -> Option<ResolvedElement> {
        self.resolve(driver, target, candidates, None).await.ok()
    }

    async fn discover<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        target: &str,
        discovery: &Discovery,
        session: &mut Session,
    ) -> Option<(ElementHandle, LocatorCandidate)> {
        let (trigger, trigger_candidate) = self
            .scan(driver, &discovery.trigger, AttemptPhase::Trigger, session)
            .await?;

        info!("Clicking discovery trigger {} for '{}'", trigger_candidate, target);
        match timeout_at(
            session.deadline,
            interact::click_handle(driver, &trigger, target),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Discovery trigger click failed: {}", e),
            Err(_) => {
                session.cut_short = true;
                return None;
            }
        }

        let settle_until = (Instant::now() + discovery.settle).min(session.deadline);
        tokio::time::sleep_until(settle_until).await;

        self.scan(driver, &discovery.rescan, AttemptPhase::Rescan, session)
            .await
    }

    async fn scan<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        candidates: &[LocatorCandidate],
        phase: AttemptPhase,
        session: &mut Session,
    ) -> Option<(ElementHandle, LocatorCandidate)> {
        for candidate in candidates {
            let remaining = session.remaining();
            if remaining.is_zero() {
                session.cut_short = true;
                return None;
            }
            let window = self.options.per_attempt_timeout.min(remaining);
            let truncated = window < self.options.per_attempt_timeout;

            let started = Instant::now();
            let (outcome, handle) = self.attempt(driver, candidate, window).await;
            let attempt = ResolutionAttempt {
                candidate: candidate.clone(),
                phase,
                outcome: outcome.clone(),
                elapsed: started.elapsed(),
            };
            debug!("{}", attempt);
            if let AttemptOutcome::Error(e) = &outcome {
                warn!("Locator {} errored: {}", candidate, e);
            }
            session.attempts.push(attempt);

            if let Some(handle) = handle {
                return Some((handle, candidate.clone()));
            }
            if truncated && session.remaining().is_zero() {
                session.cut_short = true;
                return None;
            }
        }
        None
    }

    /// Poll one candidate until it is visible or `window` elapses.
    async fn attempt<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        candidate: &LocatorCandidate,
        window: Duration,
    ) -> (AttemptOutcome, Option<ElementHandle>) {
        let deadline = Instant::now() + window;
        let mut matched = false;

        loop {
            match timeout_at(deadline, driver.query(candidate)).await {
                Err(_) => break,
                Ok(Err(e)) => return (AttemptOutcome::Error(e.to_string()), None),
                Ok(Ok(None)) => {}
                Ok(Ok(Some(handle))) => {
                    matched = true;
                    match timeout_at(deadline, driver.is_visible(&handle)).await {
                        Err(_) => break,
                        Ok(Ok(true)) => return (AttemptOutcome::Found, Some(handle)),
                        // Re-rendered between query and check; query again.
                        Ok(Ok(false)) | Ok(Err(DriverError::ElementStale { .. })) => {}
                        Ok(Err(e)) => return (AttemptOutcome::Error(e.to_string()), None),
                    }
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep_until((now + self.options.poll_interval).min(deadline)).await;
        }

        if matched {
            (AttemptOutcome::NotVisible, None)
        } else {
            (AttemptOutcome::Timeout, None)
        }
    }

    fn resolved(
        &self,
        target: &str,
        handle: ElementHandle,
        candidate: LocatorCandidate,
        phase: AttemptPhase,
        session: Session,
    ) -> ResolvedElement {
        info!(
            "Resolved '{}' via {} locator {} ({} phase, {} attempt(s))",
            target,
            candidate.kind().name(),
            candidate,
            phase.name(),
            session.attempts.len()
        );
        ResolvedElement {
            target: target.to_string(),
            handle,
            candidate,
            phase,
            attempts: session.attempts,
        }
    }
}
