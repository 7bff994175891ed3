//! Versioned rule tables and the evaluator that walks them.
//!
//! A policy is data: an ordered list of declarative predicates. The evaluator walks the list
//! in order and stops at the first rule that reaches a decision. A failing rule always
//! decides REJECT.

use serde::Serialize;
use serde_json::{Map, Value};
use veraseal_types::{Decision, RuleVerdict, TraceStep, ids};

use crate::canonical::canonicalize_value;

/// Declarative check applied to one payload key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Key exists with a non-null value.
    KeyPresent { key: &'static str },
    /// Value is a string exactly equal to one of `allowed`.
    StringOneOf {
        key: &'static str,
        allowed: &'static [&'static str],
    },
    /// Value is a string with non-whitespace content.
    NonBlankString { key: &'static str },
    /// Terminal: the decision is the literal value of `key`.
    RecordRequestedDecision { key: &'static str },
    /// Terminal: ACCEPT iff the value of `key` is boolean `true`.
    LegacyAssertTrue { key: &'static str },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub id: &'static str,
    pub name: &'static str,
    pub code: &'static str,
    pub description: &'static str,
    pub predicate: Predicate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PolicyTable {
    pub policy_id: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    /// Legacy tables emit untagged reason strings and are absent from `policy_id` in output.
    pub legacy: bool,
    pub rules: &'static [Rule],
}

impl PolicyTable {
    pub fn rules(&self) -> &'static [Rule] {
        self.rules
    }

    pub fn rule(&self, rule_id: &str) -> Option<&'static Rule> {
        self.rules.iter().find(|r| r.id == rule_id)
    }

    /// The policy id recorded in output and metadata. `None` for legacy tables.
    pub fn recorded_policy_id(&self) -> Option<&'static str> {
        if self.legacy {
            None
        } else {
            Some(self.policy_id)
        }
    }
}

const DECISION_LITERALS: &[&str] = &["ACCEPT", "REJECT"];

pub static EVALUATION_POLICY_V1: PolicyTable = PolicyTable {
    policy_id: ids::POLICY_EVALUATION_V1,
    version: ids::POLICY_EVALUATION_V1_VERSION,
    description: "Records an explicit, justified ACCEPT or REJECT requested by the caller",
    legacy: false,
    rules: &[
        Rule {
            id: ids::RULE_DECISION_REQUESTED_PRESENT,
            name: "check_decision_requested_present",
            code: ids::CODE_MISSING_DECISION_REQUESTED,
            description: "payload.decision_requested must be present",
            predicate: Predicate::KeyPresent {
                key: ids::KEY_DECISION_REQUESTED,
            },
        },
        Rule {
            id: ids::RULE_DECISION_REQUESTED_VALID,
            name: "check_decision_requested_valid",
            code: ids::CODE_INVALID_DECISION_REQUESTED,
            description: "payload.decision_requested must be exactly 'ACCEPT' or 'REJECT'",
            predicate: Predicate::StringOneOf {
                key: ids::KEY_DECISION_REQUESTED,
                allowed: DECISION_LITERALS,
            },
        },
        Rule {
            id: ids::RULE_JUSTIFICATION_PRESENT,
            name: "check_justification_present",
            code: ids::CODE_MISSING_JUSTIFICATION,
            description: "payload.justification must be present",
            predicate: Predicate::KeyPresent {
                key: ids::KEY_JUSTIFICATION,
            },
        },
        Rule {
            id: ids::RULE_JUSTIFICATION_NON_EMPTY,
            name: "check_justification_non_empty",
            code: ids::CODE_EMPTY_JUSTIFICATION,
            description: "payload.justification must be a non-empty string after trimming",
            predicate: Predicate::NonBlankString {
                key: ids::KEY_JUSTIFICATION,
            },
        },
        Rule {
            id: ids::RULE_APPLY_DECISION,
            name: "apply_decision",
            code: ids::CODE_DECISION_RECORDED,
            description: "Record the requested decision",
            predicate: Predicate::RecordRequestedDecision {
                key: ids::KEY_DECISION_REQUESTED,
            },
        },
    ],
};

pub static LEGACY_MVP_POLICY: PolicyTable = PolicyTable {
    policy_id: ids::POLICY_LEGACY_MVP,
    version: ids::POLICY_LEGACY_MVP_VERSION,
    description: "Legacy MVP placeholder rule (assert == true)",
    legacy: true,
    rules: &[Rule {
        id: ids::RULE_LEGACY_ASSERT,
        name: "mvp_assert_check",
        code: ids::CODE_LEGACY_ASSERT_TRUE,
        description: "ACCEPT iff payload.assert is boolean true",
        predicate: Predicate::LegacyAssertTrue {
            key: ids::KEY_LEGACY_ASSERT,
        },
    }],
};

/// Which rule table applies to a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolicyChoice {
    Current,
    Legacy,
}

impl PolicyChoice {
    pub fn table(self) -> &'static PolicyTable {
        match self {
            PolicyChoice::Current => &EVALUATION_POLICY_V1,
            PolicyChoice::Legacy => &LEGACY_MVP_POLICY,
        }
    }

    /// Resolve a policy id. Returns `None` for ids no table answers to.
    pub fn from_policy_id(policy_id: &str) -> Option<Self> {
        match policy_id {
            ids::POLICY_EVALUATION_V1 => Some(PolicyChoice::Current),
            ids::POLICY_LEGACY_MVP => Some(PolicyChoice::Legacy),
            _ => None,
        }
    }

    /// Resolve the policy of a stored record: records without a policy id predate versioned
    /// policies and use the legacy table.
    pub fn for_stored_record(policy_id: Option<&str>) -> Option<Self> {
        match policy_id {
            None => Some(PolicyChoice::Legacy),
            Some(id) => Self::from_policy_id(id),
        }
    }
}

/// Decision, reasons and trace produced by one walk of a rule table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyOutcome {
    pub decision: Decision,
    pub reasons: Vec<String>,
    pub trace: Vec<TraceStep>,
}

enum Step {
    Continue {
        message: String,
    },
    Terminal {
        decision: Decision,
        verdict: RuleVerdict,
        message: String,
        reason: String,
    },
}

fn reject(message: impl Into<String>, reason: impl Into<String>) -> Step {
    Step::Terminal {
        decision: Decision::Reject,
        verdict: RuleVerdict::Fail,
        message: message.into(),
        reason: reason.into(),
    }
}

/// Walk `table` over `payload`. Pure; the same inputs always give the same outcome.
pub fn evaluate_policy(table: &PolicyTable, payload: &Map<String, Value>) -> PolicyOutcome {
    let mut trace = Vec::with_capacity(table.rules.len());

    for rule in table.rules {
        match apply(rule, payload) {
            Step::Continue { message } => trace.push(TraceStep::pass(rule.id, message)),
            Step::Terminal {
                decision,
                verdict,
                message,
                reason,
            } => {
                trace.push(TraceStep {
                    rule_id: rule.id.to_string(),
                    verdict,
                    message,
                });
                let reason = if table.legacy {
                    reason
                } else {
                    format!("{}:{}: {reason}", rule.id, rule.code)
                };
                return PolicyOutcome {
                    decision,
                    reasons: vec![reason],
                    trace,
                };
            }
        }
    }

    // Fail closed: a table that never decides rejects.
    PolicyOutcome {
        decision: Decision::Reject,
        reasons: vec![format!(
            "{}: Policy '{}' reached no terminal rule",
            ids::CODE_NO_TERMINAL_RULE,
            table.policy_id
        )],
        trace,
    }
}

fn apply(rule: &Rule, payload: &Map<String, Value>) -> Step {
    match rule.predicate {
        Predicate::KeyPresent { key } => match present(payload, key) {
            Some(_) => Step::Continue {
                message: format!("payload.{key} found"),
            },
            None => reject(
                format!("payload.{key} not found"),
                format!("Required field '{key}' is missing from payload"),
            ),
        },
        Predicate::StringOneOf { key, allowed } => {
            let value = present(payload, key);
            match value.and_then(Value::as_str) {
                Some(s) if allowed.contains(&s) => Step::Continue {
                    message: format!("{key} = '{s}' is valid"),
                },
                _ => {
                    let shown = value.map(display_value).unwrap_or_else(|| "<missing>".into());
                    reject(
                        format!("{key} = '{shown}' is not valid"),
                        format!(
                            "Field '{key}' must be exactly {}, got '{shown}'",
                            quoted_alternatives(allowed)
                        ),
                    )
                }
            }
        }
        Predicate::NonBlankString { key } => match present(payload, key).and_then(Value::as_str)
        {
            Some(s) if !s.trim().is_empty() => Step::Continue {
                message: format!("{key} has {} chars", s.chars().count()),
            },
            _ => reject(
                format!("{key} is empty or not a string"),
                format!("Field '{key}' must be a non-empty string"),
            ),
        },
        Predicate::RecordRequestedDecision { key } => {
            match present(payload, key)
                .and_then(Value::as_str)
                .and_then(Decision::from_literal)
            {
                Some(decision) => Step::Terminal {
                    decision,
                    verdict: RuleVerdict::Pass,
                    message: format!("Recording decision={decision}"),
                    reason: format!("Decision '{decision}' recorded with justification"),
                },
                None => reject(
                    format!("payload.{key} is not a decision literal"),
                    format!("Field '{key}' does not hold a decision to record"),
                ),
            }
        }
        Predicate::LegacyAssertTrue { key } => match payload.get(key) {
            Some(Value::Bool(true)) => Step::Terminal {
                decision: Decision::Accept,
                verdict: RuleVerdict::Pass,
                message: format!("payload.{key} == true"),
                reason: format!("Legacy MVP rule: payload.{key} == true"),
            },
            Some(other) => {
                let shown = display_value(other);
                reject(
                    format!("{key} = {shown}"),
                    format!("Legacy MVP rule: payload.{key} == {shown} (not true)"),
                )
            }
            None => reject(
                format!("{key} key missing"),
                format!("Legacy MVP rule: payload.{key} key not present"),
            ),
        },
    }
}

/// A key counts as present only when it holds a non-null value.
fn present<'a>(payload: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    payload.get(key).filter(|v| !v.is_null())
}

/// Strings render bare; everything else renders as canonical JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => String::from_utf8_lossy(&canonicalize_value(other)).into_owned(),
    }
}

fn quoted_alternatives(allowed: &[&str]) -> String {
    allowed
        .iter()
        .map(|a| format!("'{a}'"))
        .collect::<Vec<_>>()
        .join(" or ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::payload;
    use serde_json::json;

    fn rule_ids(outcome: &PolicyOutcome) -> Vec<&str> {
        outcome.trace.iter().map(|t| t.rule_id.as_str()).collect()
    }

    #[test]
    fn canonical_accept_passes_all_five_rules() {
        let outcome = evaluate_policy(
            &EVALUATION_POLICY_V1,
            &payload(json!({
                "decision_requested": "ACCEPT",
                "justification": "Vendor passed due diligence."
            })),
        );
        assert_eq!(outcome.decision, Decision::Accept);
        assert_eq!(rule_ids(&outcome), ["R001", "R002", "R003", "R004", "R005"]);
        assert!(outcome.trace.iter().all(|t| t.verdict == RuleVerdict::Pass));
        assert_eq!(
            outcome.reasons,
            ["R005:DECISION_RECORDED: Decision 'ACCEPT' recorded with justification"]
        );
        assert_eq!(outcome.trace[3].message, "justification has 28 chars");
    }

    #[test]
    fn explicit_reject_is_recorded_as_reject() {
        let outcome = evaluate_policy(
            &EVALUATION_POLICY_V1,
            &payload(json!({"decision_requested": "REJECT", "justification": "No SOC2"})),
        );
        assert_eq!(outcome.decision, Decision::Reject);
        assert_eq!(outcome.trace.len(), 5);
        assert_eq!(outcome.trace[4].verdict, RuleVerdict::Pass);
    }

    #[test]
    fn missing_decision_stops_at_r001() {
        let outcome = evaluate_policy(
            &EVALUATION_POLICY_V1,
            &payload(json!({"justification": "x"})),
        );
        assert_eq!(outcome.decision, Decision::Reject);
        assert_eq!(rule_ids(&outcome), ["R001"]);
        assert_eq!(outcome.trace[0].verdict, RuleVerdict::Fail);
        assert_eq!(
            outcome.reasons,
            [
                "R001:MISSING_DECISION_REQUESTED: Required field 'decision_requested' is missing from payload"
            ]
        );
    }

    #[test]
    fn null_decision_counts_as_missing() {
        let outcome = evaluate_policy(
            &EVALUATION_POLICY_V1,
            &payload(json!({"decision_requested": null, "justification": "x"})),
        );
        assert_eq!(rule_ids(&outcome), ["R001"]);
    }

    #[test]
    fn no_coercion_of_decision_literal() {
        for bad in [json!("accept"), json!(true), json!(1), json!(" ACCEPT"), json!(["ACCEPT"])] {
            let outcome = evaluate_policy(
                &EVALUATION_POLICY_V1,
                &payload(json!({"decision_requested": bad.clone(), "justification": "x"})),
            );
            assert_eq!(outcome.decision, Decision::Reject, "{bad}");
            assert_eq!(rule_ids(&outcome), ["R001", "R002"]);
            assert!(outcome.reasons[0].starts_with("R002:INVALID_DECISION_REQUESTED:"));
        }
    }

    #[test]
    fn invalid_decision_reason_quotes_value() {
        let outcome = evaluate_policy(
            &EVALUATION_POLICY_V1,
            &payload(json!({"decision_requested": "accept", "justification": "x"})),
        );
        assert_eq!(
            outcome.reasons,
            [
                "R002:INVALID_DECISION_REQUESTED: Field 'decision_requested' must be exactly 'ACCEPT' or 'REJECT', got 'accept'"
            ]
        );
    }

    #[test]
    fn missing_justification_stops_at_r003() {
        let outcome = evaluate_policy(
            &EVALUATION_POLICY_V1,
            &payload(json!({"decision_requested": "ACCEPT"})),
        );
        assert_eq!(rule_ids(&outcome), ["R001", "R002", "R003"]);
        assert!(outcome.reasons[0].starts_with("R003:MISSING_JUSTIFICATION:"));
    }

    #[test]
    fn blank_or_non_string_justification_stops_at_r004() {
        for bad in [json!(""), json!("   "), json!("\t\n"), json!(42), json!(false)] {
            let outcome = evaluate_policy(
                &EVALUATION_POLICY_V1,
                &payload(json!({"decision_requested": "ACCEPT", "justification": bad.clone()})),
            );
            assert_eq!(outcome.decision, Decision::Reject, "{bad}");
            assert_eq!(rule_ids(&outcome), ["R001", "R002", "R003", "R004"]);
            assert_eq!(
                outcome.reasons,
                ["R004:EMPTY_JUSTIFICATION: Field 'justification' must be a non-empty string"]
            );
        }
    }

    #[test]
    fn legacy_table_accepts_only_boolean_true() {
        let accept = evaluate_policy(&LEGACY_MVP_POLICY, &payload(json!({"assert": true})));
        assert_eq!(accept.decision, Decision::Accept);
        assert_eq!(accept.reasons, ["Legacy MVP rule: payload.assert == true"]);
        assert_eq!(rule_ids(&accept), ["LEGACY"]);

        let stringly = evaluate_policy(&LEGACY_MVP_POLICY, &payload(json!({"assert": "true"})));
        assert_eq!(stringly.decision, Decision::Reject);
        assert_eq!(
            stringly.reasons,
            ["Legacy MVP rule: payload.assert == true (not true)"]
        );

        let missing = evaluate_policy(&LEGACY_MVP_POLICY, &payload(json!({})));
        assert_eq!(missing.decision, Decision::Reject);
        assert_eq!(
            missing.reasons,
            ["Legacy MVP rule: payload.assert key not present"]
        );
    }

    #[test]
    fn legacy_table_ignores_current_fields() {
        let outcome = evaluate_policy(
            &LEGACY_MVP_POLICY,
            &payload(json!({"decision_requested": "ACCEPT", "justification": "x"})),
        );
        assert_eq!(outcome.decision, Decision::Reject);
    }

    #[test]
    fn table_without_terminal_rule_fails_closed() {
        static CHECK_ONLY: PolicyTable = PolicyTable {
            policy_id: "check-only",
            version: "0.1.0",
            description: "never decides",
            legacy: false,
            rules: &[Rule {
                id: "C001",
                name: "present",
                code: "MISSING",
                description: "",
                predicate: Predicate::KeyPresent { key: "k" },
            }],
        };
        let outcome = evaluate_policy(&CHECK_ONLY, &payload(json!({"k": 1})));
        assert_eq!(outcome.decision, Decision::Reject);
        assert_eq!(outcome.trace.len(), 1);
        assert!(outcome.reasons[0].starts_with("NO_TERMINAL_RULE:"));
    }

    #[test]
    fn stored_record_dispatch() {
        assert_eq!(PolicyChoice::for_stored_record(None), Some(PolicyChoice::Legacy));
        assert_eq!(
            PolicyChoice::for_stored_record(Some("evaluation-policy-v1")),
            Some(PolicyChoice::Current)
        );
        assert_eq!(
            PolicyChoice::for_stored_record(Some("mvp-placeholder-v0")),
            Some(PolicyChoice::Legacy)
        );
        assert_eq!(PolicyChoice::for_stored_record(Some("nope")), None);
    }

    #[test]
    fn legacy_table_records_no_policy_id() {
        assert_eq!(LEGACY_MVP_POLICY.recorded_policy_id(), None);
        assert_eq!(
            EVALUATION_POLICY_V1.recorded_policy_id(),
            Some("evaluation-policy-v1")
        );
    }

    #[test]
    fn every_rule_has_an_explanation() {
        for table in [&EVALUATION_POLICY_V1, &LEGACY_MVP_POLICY] {
            for rule in table.rules() {
                assert!(veraseal_types::lookup_explanation(rule.id).is_some(), "{}", rule.id);
                assert!(veraseal_types::lookup_explanation(rule.code).is_some(), "{}", rule.code);
            }
        }
    }

    #[test]
    fn table_serializes_as_introspectable_data() {
        let value = serde_json::to_value(&EVALUATION_POLICY_V1).expect("serialize");
        assert_eq!(value["rules"][1]["predicate"]["kind"], "string_one_of");
        assert_eq!(value["rules"][1]["predicate"]["allowed"], json!(["ACCEPT", "REJECT"]));
    }
}
