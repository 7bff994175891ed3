//! Canonical bytes of the four per-evaluation files.

use veraseal_types::{EvaluationMetadata, ids};

use crate::canonical::{canonicalize, sha256_hex};
use crate::engine::Evaluation;
use crate::error::InvariantViolation;

/// File contents for one evaluation, ready to hand to a store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactSet {
    pub input: Vec<u8>,
    pub output: Vec<u8>,
    pub trace: Vec<u8>,
    pub metadata: Vec<u8>,
}

impl ArtifactSet {
    /// `(file name, bytes)` in manifest order.
    pub fn files(&self) -> [(&'static str, &[u8]); 4] {
        [
            (ids::FILE_INPUT, self.input.as_slice()),
            (ids::FILE_OUTPUT, self.output.as_slice()),
            (ids::FILE_TRACE, self.trace.as_slice()),
            (ids::FILE_METADATA, self.metadata.as_slice()),
        ]
    }
}

pub fn metadata_for(evaluation: &Evaluation, trace_sha256: String) -> EvaluationMetadata {
    let request = &evaluation.request;
    let result = &evaluation.result;
    EvaluationMetadata {
        evaluation_id: result.evaluation_id.clone(),
        subject: request.subject.clone(),
        ruleset: request.ruleset.clone(),
        injected_time_utc: request.injected_time_utc.clone(),
        created_time_utc: result.created_time_utc.clone(),
        input_sha256: result.input_sha256.clone(),
        output_sha256: result.output_sha256.clone(),
        trace_sha256,
        policy_id: result.policy_id.clone(),
        policy_version: result
            .policy_id
            .as_ref()
            .map(|_| evaluation.policy.version.to_string()),
    }
}

/// Render the four files. Failure means the engine produced something unserializable.
pub fn render_artifacts(evaluation: &Evaluation) -> Result<ArtifactSet, InvariantViolation> {
    let defect = |e: crate::error::CanonicalizationError| InvariantViolation {
        check: "artifact_canonicalization",
        detail: e.to_string(),
    };

    let output = canonicalize(&evaluation.result).map_err(defect)?;
    let trace = canonicalize(&evaluation.result.trace).map_err(defect)?;
    let metadata = metadata_for(evaluation, sha256_hex(&trace));
    let metadata = canonicalize(&metadata).map_err(defect)?;

    Ok(ArtifactSet {
        input: evaluation.input_canonical.clone(),
        output,
        trace,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evaluate;
    use crate::invariants::EnvelopeLimits;
    use crate::policy::PolicyChoice;
    use crate::test_support::{accept_request, request_with_payload};
    use serde_json::{Value, json};

    #[test]
    fn files_are_canonical_json_in_manifest_order() {
        let evaluation =
            evaluate(&accept_request(), PolicyChoice::Current, &EnvelopeLimits::default())
                .expect("evaluates");
        let set = render_artifacts(&evaluation).expect("renders");
        let names: Vec<&str> = set.files().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            ["input.json", "output.json", "trace.json", "metadata.json"]
        );
        for (name, bytes) in set.files() {
            let value: Value = serde_json::from_slice(bytes).expect(name);
            assert_eq!(crate::canonical::canonicalize_value(&value), bytes, "{name}");
        }
    }

    #[test]
    fn metadata_references_hashes() {
        let evaluation =
            evaluate(&accept_request(), PolicyChoice::Current, &EnvelopeLimits::default())
                .expect("evaluates");
        let set = render_artifacts(&evaluation).expect("renders");
        let metadata: Value = serde_json::from_slice(&set.metadata).expect("json");
        assert_eq!(metadata["evaluation_id"], json!(evaluation.result.evaluation_id));
        assert_eq!(metadata["trace_sha256"], json!(sha256_hex(&set.trace)));
        assert_eq!(metadata["input_sha256"], json!(sha256_hex(&set.input)));
        assert_eq!(metadata["policy_id"], "evaluation-policy-v1");
        assert_eq!(metadata["policy_version"], "1.0.0");
        assert_eq!(metadata["subject"], "vendor-approval");
    }

    #[test]
    fn legacy_metadata_omits_policy_fields() {
        let evaluation = evaluate(
            &request_with_payload(json!({"assert": true})),
            PolicyChoice::Legacy,
            &EnvelopeLimits::default(),
        )
        .expect("evaluates");
        let set = render_artifacts(&evaluation).expect("renders");
        let metadata: Value = serde_json::from_slice(&set.metadata).expect("json");
        assert!(metadata.get("policy_id").is_none());
        assert!(metadata.get("policy_version").is_none());
        let output: Value = serde_json::from_slice(&set.output).expect("json");
        assert!(output.get("policy_id").is_none());
    }
}
