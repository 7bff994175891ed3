//! Pure decision evaluation (no IO).
//!
//! Input: a request envelope handed in by the caller, including its injected timestamp.
//! Output: canonical bytes, digests, decision, reasons and trace.
//!
//! Nothing in this crate reads a clock, draws random numbers, touches the environment or
//! the filesystem. `tests/determinism_discipline.rs` enforces that.

#![forbid(unsafe_code)]

pub mod artifacts;
pub mod canonical;
pub mod error;
pub mod invariants;
pub mod policy;

mod engine;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use artifacts::{ArtifactSet, render_artifacts};
pub use canonical::{canonicalize, canonicalize_value, derive_id, sha256_hex};
pub use engine::{Evaluation, evaluate};
pub use error::{CanonicalizationError, EngineError, EnvelopeError, InvariantViolation};
pub use invariants::{EnvelopeLimits, check_post, check_pre, parse_envelope, parse_envelope_slice};
pub use policy::{
    EVALUATION_POLICY_V1, LEGACY_MVP_POLICY, PolicyChoice, PolicyOutcome, PolicyTable, Predicate,
    Rule, evaluate_policy,
};
