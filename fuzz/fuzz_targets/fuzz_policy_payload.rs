//! Fuzz target for the rule evaluator with structured payloads.
//!
//! Goal: only the exact literals `ACCEPT` and `REJECT` with a non-blank justification can
//! produce ACCEPT, and evaluation is deterministic.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_policy_payload
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value};
use veraseal_domain::{EVALUATION_POLICY_V1, evaluate_policy};
use veraseal_types::Decision;

#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl FuzzValue {
    fn into_json(self) -> Value {
        match self {
            FuzzValue::Null => Value::Null,
            FuzzValue::Bool(b) => Value::Bool(b),
            FuzzValue::Int(i) => Value::from(i),
            FuzzValue::Text(s) => Value::String(s),
        }
    }
}

#[derive(Debug, Arbitrary)]
struct FuzzPayload {
    decision_requested: Option<FuzzValue>,
    justification: Option<FuzzValue>,
    extra: Vec<(String, FuzzValue)>,
}

fuzz_target!(|input: FuzzPayload| {
    let mut payload = Map::new();
    for (key, value) in input.extra {
        payload.insert(key, value.into_json());
    }
    if let Some(value) = input.decision_requested {
        payload.insert("decision_requested".to_string(), value.into_json());
    }
    if let Some(value) = input.justification {
        payload.insert("justification".to_string(), value.into_json());
    }

    let outcome = evaluate_policy(&EVALUATION_POLICY_V1, &payload);
    assert_eq!(outcome, evaluate_policy(&EVALUATION_POLICY_V1, &payload));
    assert!(!outcome.reasons.is_empty());

    if outcome.decision == Decision::Accept {
        assert_eq!(payload.get("decision_requested"), Some(&Value::from("ACCEPT")));
        let justification = payload.get("justification").and_then(Value::as_str);
        assert!(justification.is_some_and(|j| !j.trim().is_empty()));
    }
});
