//! The `describe` use case: the active rule table as data, for documentation endpoints.

use serde::Serialize;
use serde_json::{Map, Value};
use veraseal_domain::{PolicyChoice, Rule, evaluate_policy};
use veraseal_types::{Decision, EvaluationRequest, lookup_explanation};

use crate::recorder::Recorder;

const EXAMPLE_SUBJECT: &str = "vendor-approval";
const EXAMPLE_RULESET: &str = "procurement-v1";
const EXAMPLE_TIME: &str = "2024-01-15T10:30:00Z";

/// A policy's identity, ordered rules, request schema and worked examples.
#[derive(Clone, Debug, Serialize)]
pub struct PolicyDescription {
    pub policy_id: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub rules: &'static [Rule],
    pub request_schema: Value,
    pub examples: Vec<PolicyExample>,
}

/// A complete request and what the policy decides for it.
#[derive(Clone, Debug, Serialize)]
pub struct PolicyExample {
    pub name: String,
    pub request: EvaluationRequest,
    pub expected_decision: Decision,
    pub expected_reasons: Vec<String>,
}

impl Recorder {
    pub fn describe_policy(&self) -> PolicyDescription {
        describe_policy(self.config().policy)
    }
}

pub fn describe_policy(choice: PolicyChoice) -> PolicyDescription {
    let table = choice.table();

    let mut examples = Vec::new();
    if !table.legacy {
        examples.push(example(
            "canonical_accept".to_string(),
            r#"{"decision_requested": "ACCEPT", "justification": "Vendor passed due diligence."}"#,
            choice,
        ));
    }
    for rule in table.rules() {
        let Some(explanation) = lookup_explanation(rule.id) else {
            continue;
        };
        examples.push(example(
            format!("{}_fails", rule.id),
            explanation.examples.before,
            choice,
        ));
        examples.push(example(
            format!("{}_passes", rule.id),
            explanation.examples.after,
            choice,
        ));
    }

    PolicyDescription {
        policy_id: table.policy_id,
        version: table.version,
        description: table.description,
        rules: table.rules(),
        request_schema: schemars::schema_for!(EvaluationRequest).to_value(),
        examples: examples.into_iter().flatten().collect(),
    }
}

/// `None` when the payload text is not a JSON object; the registry tests rule that out.
fn example(name: String, payload: &str, choice: PolicyChoice) -> Option<PolicyExample> {
    let payload: Map<String, Value> = serde_json::from_str(payload).ok()?;
    let outcome = evaluate_policy(choice.table(), &payload);
    Some(PolicyExample {
        name,
        request: EvaluationRequest::v1(EXAMPLE_SUBJECT, EXAMPLE_RULESET, payload, EXAMPLE_TIME),
        expected_decision: outcome.decision,
        expected_reasons: outcome.reasons,
    })
}
