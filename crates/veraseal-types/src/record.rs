use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::ids;

/// Final outcome of an evaluation. Serialized as the exact literals `ACCEPT` / `REJECT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Accept => "ACCEPT",
            Decision::Reject => "REJECT",
        }
    }

    /// Exact literal match; no case folding.
    pub fn from_literal(value: &str) -> Option<Self> {
        match value {
            "ACCEPT" => Some(Decision::Accept),
            "REJECT" => Some(Decision::Reject),
            _ => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RuleVerdict {
    Pass,
    Fail,
}

/// One rule considered by the evaluator, in evaluation order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TraceStep {
    pub rule_id: String,
    pub verdict: RuleVerdict,
    pub message: String,
}

impl TraceStep {
    pub fn pass(rule_id: &str, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            verdict: RuleVerdict::Pass,
            message: message.into(),
        }
    }

    pub fn fail(rule_id: &str, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            verdict: RuleVerdict::Fail,
            message: message.into(),
        }
    }
}

/// Request envelope handed in by the caller.
///
/// The caller supplies `injected_time_utc`; nothing in the engine reads a clock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EvaluationRequest {
    /// Envelope version, must be `v1`.
    pub version: String,
    /// What is being decided (e.g. `vendor-approval`).
    #[schemars(length(min = 1, max = 128))]
    pub subject: String,
    /// Which rules or policy the caller is applying.
    #[schemars(length(min = 1, max = 128))]
    pub ruleset: String,
    /// Decision data evaluated by the rule table.
    pub payload: Map<String, Value>,
    /// RFC 3339 timestamp in UTC, supplied by the caller.
    pub injected_time_utc: String,
}

impl EvaluationRequest {
    pub fn v1(
        subject: impl Into<String>,
        ruleset: impl Into<String>,
        payload: Map<String, Value>,
        injected_time_utc: impl Into<String>,
    ) -> Self {
        Self {
            version: ids::ENVELOPE_VERSION_V1.to_string(),
            subject: subject.into(),
            ruleset: ruleset.into(),
            payload,
            injected_time_utc: injected_time_utc.into(),
        }
    }
}

/// The persisted `output.json` record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EvaluationResult {
    pub evaluation_id: String,
    pub input_sha256: String,
    pub output_sha256: String,
    pub decision: Decision,
    pub reasons: Vec<String>,
    pub trace: Vec<TraceStep>,
    pub created_time_utc: String,
    /// Rule table used. Absent on legacy records that predate versioned policies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
}

/// The persisted `metadata.json` record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EvaluationMetadata {
    pub evaluation_id: String,
    pub subject: String,
    pub ruleset: String,
    pub injected_time_utc: String,
    pub created_time_utc: String,
    pub input_sha256: String,
    pub output_sha256: String,
    pub trace_sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_version: Option<String>,
}
