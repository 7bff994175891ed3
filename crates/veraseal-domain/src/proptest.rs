//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Canonical bytes independent of key insertion order
//! - Evaluation determinism and POST validity for arbitrary payloads
//! - No coercion of `decision_requested`

use crate::canonical::{canonicalize, canonicalize_value, derive_id, sha256_hex};
use crate::engine::evaluate;
use crate::invariants::{EnvelopeLimits, check_post};
use crate::policy::{EVALUATION_POLICY_V1, PolicyChoice, evaluate_policy};
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use veraseal_types::{Decision, EvaluationRequest, RuleVerdict};

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

/// Strategy for JSON leaves (finite numbers only).
fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9).prop_map(|f| json!(f)),
        "[a-zA-Z0-9 éü✓_-]{0,12}".prop_map(Value::String),
    ]
}

/// Strategy for nested JSON values up to a small depth.
fn arb_json() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,6}", inner), 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

/// Strategy for payload maps as `(key, value)` entry lists.
fn arb_entries() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::vec(("[a-z_]{1,10}", arb_json()), 0..6)
}

/// Strategy for values that are not the exact decision literals.
fn arb_non_literal_decision() -> impl Strategy<Value = Value> {
    prop_oneof![
        arb_leaf(),
        "[a-zA-Z ]{0,10}".prop_map(Value::String),
        Just(json!("accept")),
        Just(json!("Reject")),
        Just(json!("ACCEPT ")),
        Just(json!([ "ACCEPT" ])),
    ]
    .prop_filter("must not be an exact literal", |v| {
        v != &json!("ACCEPT") && v != &json!("REJECT") && !v.is_null()
    })
}

fn request(payload: Map<String, Value>) -> EvaluationRequest {
    EvaluationRequest::v1("subject", "ruleset", payload, "2024-01-15T10:30:00Z")
}

/// Build an object by inserting `entries` in the given order. Later duplicates win.
fn object_from(entries: &[(String, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in entries {
        map.insert(k.clone(), v.clone());
    }
    map
}

proptest! {
    #[test]
    fn canonical_bytes_ignore_insertion_order(entries in arb_entries()) {
        // Deduplicate so that reversing does not change which duplicate wins.
        let mut seen = std::collections::BTreeSet::new();
        let unique: Vec<(String, Value)> = entries
            .into_iter()
            .filter(|(k, _)| seen.insert(k.clone()))
            .collect();
        let forward = object_from(&unique);
        let reversed_entries: Vec<_> = unique.iter().rev().cloned().collect();
        let reversed = object_from(&reversed_entries);

        prop_assert_eq!(
            canonicalize_value(&Value::Object(forward)),
            canonicalize_value(&Value::Object(reversed))
        );
    }

    #[test]
    fn canonical_bytes_are_a_fixed_point(value in arb_json()) {
        let bytes = canonicalize_value(&value);
        let reparsed: Value = serde_json::from_slice(&bytes).expect("canonical output parses");
        prop_assert_eq!(canonicalize_value(&reparsed), bytes);
    }

    #[test]
    fn strict_serializer_matches_value_writer(value in arb_json()) {
        prop_assert_eq!(canonicalize(&value).expect("finite json"), canonicalize_value(&value));
    }

    #[test]
    fn evaluation_is_deterministic_and_post_valid(entries in arb_entries()) {
        let request = request(object_from(&entries));
        let first = evaluate(&request, PolicyChoice::Current, &EnvelopeLimits::default())
            .expect("valid envelope");
        let second = evaluate(&request, PolicyChoice::Current, &EnvelopeLimits::default())
            .expect("valid envelope");

        prop_assert_eq!(&first.result, &second.result);
        prop_assert!(check_post(&first.result).is_ok());
        prop_assert_eq!(&first.result.evaluation_id, &derive_id(&first.result.input_sha256));
        prop_assert_eq!(sha256_hex(&first.input_canonical), first.result.input_sha256.clone());
        prop_assert!(!first.result.reasons.is_empty());
    }

    #[test]
    fn trace_stops_at_first_failure(entries in arb_entries()) {
        let outcome = evaluate_policy(&EVALUATION_POLICY_V1, &object_from(&entries));
        let failures = outcome
            .trace
            .iter()
            .filter(|t| t.verdict == RuleVerdict::Fail)
            .count();
        prop_assert!(failures <= 1);
        if failures == 1 {
            prop_assert_eq!(outcome.trace.last().map(|t| t.verdict), Some(RuleVerdict::Fail));
            prop_assert_eq!(outcome.decision, Decision::Reject);
        }
        prop_assert!(!outcome.trace.is_empty());
        prop_assert!(outcome.trace.len() <= EVALUATION_POLICY_V1.rules().len());
    }

    #[test]
    fn decision_is_never_coerced(value in arb_non_literal_decision(), justification in "[a-z]{1,20}") {
        let mut payload = Map::new();
        payload.insert("decision_requested".to_string(), value);
        payload.insert("justification".to_string(), Value::String(justification));
        let outcome = evaluate_policy(&EVALUATION_POLICY_V1, &payload);
        prop_assert_eq!(outcome.decision, Decision::Reject);
        prop_assert_eq!(outcome.trace.len(), 2);
    }

    #[test]
    fn explicit_literal_is_recorded(accept in any::<bool>(), justification in "[a-z][a-z ]{0,20}") {
        let literal = if accept { "ACCEPT" } else { "REJECT" };
        let mut payload = Map::new();
        payload.insert("decision_requested".to_string(), json!(literal));
        payload.insert("justification".to_string(), json!(justification));
        let outcome = evaluate_policy(&EVALUATION_POLICY_V1, &payload);
        prop_assert_eq!(outcome.decision.as_str(), literal);
        prop_assert_eq!(outcome.trace.len(), 5);
    }
}
