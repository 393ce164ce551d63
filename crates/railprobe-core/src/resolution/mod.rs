pub mod attempt;
pub mod engine;
pub mod result;
pub mod target;

pub use attempt::{AttemptOutcome, AttemptPhase, ResolutionAttempt};
pub use engine::{ResolveOptions, Resolver};
pub use result::{FailureKind, ResolutionFailure, ResolvedElement};
pub use target::{Discovery, Requirement, Target};
