use serde_json::{Map, Value, json};
use veraseal_types::{Decision, EvaluationRequest, EvaluationResult, TraceStep};

use crate::canonical::sha256_hex;

pub const FIXED_TIME: &str = "2024-01-15T10:30:00Z";

pub fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("payload fixture must be an object, got {other}"),
    }
}

pub fn request_with_payload(value: Value) -> EvaluationRequest {
    EvaluationRequest::v1("vendor-approval", "procurement-v1", payload(value), FIXED_TIME)
}

pub fn accept_request() -> EvaluationRequest {
    request_with_payload(json!({
        "decision_requested": "ACCEPT",
        "justification": "Vendor passed due diligence."
    }))
}

pub fn accept_request_value() -> Value {
    serde_json::to_value(accept_request()).expect("request serializes")
}

pub fn result_fixture() -> EvaluationResult {
    let input_sha256 = sha256_hex(b"input");
    EvaluationResult {
        evaluation_id: input_sha256[..16].to_string(),
        input_sha256,
        output_sha256: sha256_hex(b"output"),
        decision: Decision::Accept,
        reasons: vec!["R005:DECISION_RECORDED: Decision 'ACCEPT' recorded with justification".to_string()],
        trace: vec![TraceStep::pass("R005", "Recording decision=ACCEPT")],
        created_time_utc: FIXED_TIME.to_string(),
        policy_id: Some("evaluation-policy-v1".to_string()),
    }
}
