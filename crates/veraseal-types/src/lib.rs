//! Stable DTOs and IDs used across the VeraSeal workspace.
//!
//! This crate is intentionally boring:
//! - data types for the persisted evaluation artifacts
//! - stable string IDs for policies, rules and reason codes
//! - the validated evaluation id
//! - explain registry for rules and reason codes

#![forbid(unsafe_code)]

pub mod explain;
pub mod id;
pub mod ids;
pub mod manifest;
pub mod record;
pub mod report;

pub use explain::{ExamplePayloads, Explanation, all_codes, all_rule_ids, lookup_explanation};
pub use id::{EvaluationId, InvalidEvaluationId, is_evaluation_id, is_sha256_hex};
pub use manifest::{Manifest, ManifestEntry};
pub use record::{
    Decision, EvaluationMetadata, EvaluationRequest, EvaluationResult, RuleVerdict, TraceStep,
};
pub use report::{IntegrityReport, ReplayReport};
