//! Use case orchestration for VeraSeal.
//!
//! This crate provides the application layer: use cases that coordinate the domain engine, the
//! artifact store and the resolved configuration. It is intentionally thin and delegates the
//! heavy lifting to those layers.
//!
//! An outer transport (HTTP, CLI, queue consumer) depends on this crate and maps the
//! [`ErrorClass`] of each failure to its own signals.

#![forbid(unsafe_code)]

mod describe;
mod error;
mod integrity;
mod recorder;
mod replay;
mod self_check;

pub use describe::{PolicyDescription, PolicyExample, describe_policy};
pub use error::{ErrorClass, LookupError, ReplayError, SubmitError};
pub use recorder::{EvaluationRecord, Recorder, Submission};
pub use replay::replay_artifacts;
pub use self_check::{SelfCheckReport, self_check};

pub use veraseal_store::ArtifactKind;
