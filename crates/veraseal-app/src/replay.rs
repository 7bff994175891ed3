//! The `replay` use case: re-derive a stored evaluation and compare.
//!
//! Replay is read-only. Every discrepancy becomes a mismatch line in the report; only engine
//! defects and storage failures are errors.

use serde_json::{Map, Value};
use tracing::{info, warn};
use veraseal_domain::{
    ArtifactSet, EngineError, EnvelopeLimits, InvariantViolation, PolicyChoice, evaluate,
    parse_envelope_slice,
};
use veraseal_types::{EvaluationId, ReplayReport, ids};

use crate::error::ReplayError;
use crate::recorder::Recorder;

const MISSING: &str = "<missing>";
const FIELD_POLICY_ID: &str = "policy_id";

impl Recorder {
    pub fn replay(&self, id: &str) -> Result<ReplayReport, ReplayError> {
        let id = EvaluationId::parse(id).map_err(|_| ReplayError::NotFound {
            evaluation_id: id.to_string(),
        })?;
        let stored = self.store().load(&id)?;
        let report = replay_artifacts(&id, &stored, self.limits())?;

        if report.ok {
            info!(evaluation_id = %id, "replay matched");
        } else {
            warn!(
                evaluation_id = %id,
                mismatches = report.mismatches.len(),
                "replay found mismatches"
            );
        }
        Ok(report)
    }
}

/// Re-derive one evaluation from its stored files.
///
/// The policy comes from `metadata.json`: its `policy_id` when present, the legacy table
/// otherwise. The stored input is re-validated, re-canonicalized and re-evaluated, and
/// `evaluation_id`, `input_sha256`, `output_sha256` and `decision` are compared with the
/// stored `output.json`. The replayed `evaluation_id` must also equal `id`, the key the
/// record is stored under.
pub fn replay_artifacts(
    id: &EvaluationId,
    stored: &ArtifactSet,
    limits: &EnvelopeLimits,
) -> Result<ReplayReport, InvariantViolation> {
    let mut mismatches = Vec::new();

    let saved_output = match parse_object(&stored.output) {
        Ok(object) => object,
        Err(detail) => {
            mismatches.push(format!("{} unreadable: {detail}", ids::FILE_OUTPUT));
            Map::new()
        }
    };

    let metadata = match parse_object(&stored.metadata) {
        Ok(object) => object,
        Err(detail) => {
            mismatches.push(format!("{} unreadable: {detail}", ids::FILE_METADATA));
            return Ok(ReplayReport::from_mismatches(id.as_str(), mismatches));
        }
    };

    let saved_policy = saved_output.get(FIELD_POLICY_ID).filter(|v| !v.is_null());
    let metadata_policy = metadata.get(FIELD_POLICY_ID).filter(|v| !v.is_null());
    if saved_policy != metadata_policy {
        mismatches.push(format!(
            "policy_id mismatch: output={}, metadata={}",
            display(saved_policy),
            display(metadata_policy)
        ));
    }

    let choice = match metadata_policy {
        None => Some(PolicyChoice::Legacy),
        Some(Value::String(policy_id)) => {
            PolicyChoice::for_stored_record(Some(policy_id.as_str()))
        }
        Some(_) => None,
    };
    let Some(choice) = choice else {
        mismatches.push(format!(
            "policy_id unknown: saved={}",
            display(metadata_policy)
        ));
        return Ok(ReplayReport::from_mismatches(id.as_str(), mismatches));
    };

    let request = match parse_envelope_slice(&stored.input, limits) {
        Ok(request) => request,
        Err(e) => {
            mismatches.push(format!("{} invalid: {e}", ids::FILE_INPUT));
            return Ok(ReplayReport::from_mismatches(id.as_str(), mismatches));
        }
    };

    let replayed = match evaluate(&request, choice, limits) {
        Ok(evaluation) => evaluation.result,
        Err(EngineError::Envelope(e)) => {
            mismatches.push(format!("{} invalid: {e}", ids::FILE_INPUT));
            return Ok(ReplayReport::from_mismatches(id.as_str(), mismatches));
        }
        Err(EngineError::Invariant(violation)) => return Err(violation),
    };

    // Records are keyed by their id; a copied or renamed record must not replay clean.
    if replayed.evaluation_id != id.as_str() {
        mismatches.push(format!(
            "evaluation_id mismatch: saved={id}, replayed={}",
            replayed.evaluation_id
        ));
    }

    let compared = [
        ("evaluation_id", replayed.evaluation_id.as_str()),
        ("input_sha256", replayed.input_sha256.as_str()),
        ("output_sha256", replayed.output_sha256.as_str()),
        ("decision", replayed.decision.as_str()),
    ];
    for (field, replayed_value) in compared {
        let saved = display(saved_output.get(field));
        if saved != replayed_value {
            mismatches.push(format!(
                "{field} mismatch: saved={saved}, replayed={replayed_value}"
            ));
        }
    }

    Ok(ReplayReport::from_mismatches(id.as_str(), mismatches))
}

fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>, String> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err("not a JSON object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn display(value: Option<&Value>) -> String {
    match value {
        None => MISSING.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
