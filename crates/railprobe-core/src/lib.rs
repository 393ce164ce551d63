//! Resilient element resolution for browser tests against markup that keeps
//! shifting under them, plus the scenarios that exercise it.

pub mod backend;
pub mod config;
pub mod cookies;
pub mod interact;
pub mod locator;
pub mod resolution;
pub mod scenario;
pub mod wait;

pub use backend::{BoundingBox, DriverError, ElementHandle, LoadState, NavigationResult, PageDriver};
pub use locator::{AttrMatch, LocatorCandidate, LocatorKind};
pub use resolution::{
    AttemptOutcome, AttemptPhase, Discovery, FailureKind, Requirement, ResolutionAttempt,
    ResolutionFailure, ResolveOptions, ResolvedElement, Resolver, Target,
};
