//! Side-effect-free startup diagnostics.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info};
use veraseal_domain::{
    EnvelopeLimits, PolicyChoice, canonicalize, canonicalize_value, evaluate, parse_envelope,
    sha256_hex,
};
use veraseal_types::Decision;

/// SHA-256 of the empty input.
const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SelfCheckReport {
    pub ok: bool,
    /// A fixed well-formed request passes envelope validation.
    pub envelope_valid: bool,
    /// The digest matches a known vector and canonical bytes ignore key order.
    pub hash_deterministic: bool,
    /// Evaluating the same request twice gives identical results.
    pub evaluation_deterministic: bool,
}

fn fixed_request() -> Value {
    json!({
        "version": "v1",
        "subject": "s",
        "ruleset": "r",
        "payload": {
            "decision_requested": "ACCEPT",
            "justification": "self-check"
        },
        "injected_time_utc": "2000-01-01T00:00:00Z"
    })
}

pub fn self_check(policy: PolicyChoice, limits: &EnvelopeLimits) -> SelfCheckReport {
    let fixed = fixed_request();
    let request = parse_envelope(&fixed, limits);
    let envelope_valid = request.is_ok();

    let hash_deterministic = sha256_hex(b"") == EMPTY_SHA256
        && canonicalize_value(&json!({"b": 1, "a": [true, null]}))
            == canonicalize_value(&json!({"a": [true, null], "b": 1}))
        && canonicalize(&fixed).ok() == Some(canonicalize_value(&fixed));

    let evaluation_deterministic = request.as_ref().is_ok_and(|r| {
        match (evaluate(r, policy, limits), evaluate(r, policy, limits)) {
            (Ok(first), Ok(second)) => {
                first.result == second.result
                    && first.input_canonical == second.input_canonical
                    && (policy.table().legacy || first.result.decision == Decision::Accept)
            }
            _ => false,
        }
    });

    let report = SelfCheckReport {
        ok: envelope_valid && hash_deterministic && evaluation_deterministic,
        envelope_valid,
        hash_deterministic,
        evaluation_deterministic,
    };
    if report.ok {
        info!("self-check passed");
    } else {
        error!(
            envelope_valid,
            hash_deterministic,
            evaluation_deterministic,
            "self-check failed"
        );
    }
    report
}

impl crate::recorder::Recorder {
    pub fn self_check(&self) -> SelfCheckReport {
        self_check(self.config().policy, self.limits())
    }
}
