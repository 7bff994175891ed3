use serde::Serialize;
use veraseal_types::{Decision, EvaluationRequest, EvaluationResult, TraceStep};

use crate::canonical::{canonicalize, derive_id, sha256_hex};
use crate::error::{EngineError, EnvelopeError, InvariantViolation};
use crate::invariants::{EnvelopeLimits, check_post, check_pre};
use crate::policy::{PolicyChoice, PolicyTable, evaluate_policy};

/// A completed evaluation: the request as evaluated, its canonical bytes, and the result.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub request: EvaluationRequest,
    pub input_canonical: Vec<u8>,
    pub result: EvaluationResult,
    pub policy: &'static PolicyTable,
}

/// Everything in `output.json` except `output_sha256` itself.
#[derive(Serialize)]
struct OutputDigest<'a> {
    evaluation_id: &'a str,
    input_sha256: &'a str,
    decision: Decision,
    reasons: &'a [String],
    trace: &'a [TraceStep],
    created_time_utc: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    policy_id: Option<&'a str>,
}

/// PRE -> canonicalize -> hash -> evaluate -> hash -> POST.
///
/// Pure: no clock, no randomness, no I/O. The same request and policy always produce
/// byte-identical results.
pub fn evaluate(
    request: &EvaluationRequest,
    choice: PolicyChoice,
    limits: &EnvelopeLimits,
) -> Result<Evaluation, EngineError> {
    check_pre(request, limits)?;

    let input_canonical = canonicalize(request).map_err(EnvelopeError::from)?;
    let input_sha256 = sha256_hex(&input_canonical);
    let evaluation_id = derive_id(&input_sha256);

    let table = choice.table();
    let outcome = evaluate_policy(table, &request.payload);
    let policy_id = table.recorded_policy_id();

    let digest = OutputDigest {
        evaluation_id: &evaluation_id,
        input_sha256: &input_sha256,
        decision: outcome.decision,
        reasons: &outcome.reasons,
        trace: &outcome.trace,
        created_time_utc: &request.injected_time_utc,
        policy_id,
    };
    let output_canonical = canonicalize(&digest).map_err(|e| InvariantViolation {
        check: "output_canonicalization",
        detail: e.to_string(),
    })?;
    let output_sha256 = sha256_hex(&output_canonical);

    let result = EvaluationResult {
        evaluation_id,
        input_sha256,
        output_sha256,
        decision: outcome.decision,
        reasons: outcome.reasons,
        trace: outcome.trace,
        created_time_utc: request.injected_time_utc.clone(),
        policy_id: policy_id.map(str::to_string),
    };

    check_post(&result)?;

    Ok(Evaluation {
        request: request.clone(),
        input_canonical,
        result,
        policy: table,
    })
}
