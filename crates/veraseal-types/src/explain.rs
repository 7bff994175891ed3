//! Explain registry for rules and reason codes.
//!
//! Maps rule ids and codes to human-readable explanations with example payloads.

use crate::ids;

/// Explanation entry for a rule or code.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the rule/code.
    pub title: &'static str,
    /// What the rule checks.
    pub description: &'static str,
    /// How to make a request pass the rule.
    pub remediation: &'static str,
    /// Before/after payload examples.
    pub examples: ExamplePayloads,
}

/// Before and after payload examples, as JSON text.
#[derive(Debug, Clone)]
pub struct ExamplePayloads {
    /// Payload that fails the rule.
    pub before: &'static str,
    /// Payload that passes the rule.
    pub after: &'static str,
}

/// Look up an explanation by rule id or code.
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        // Rule IDs
        ids::RULE_DECISION_REQUESTED_PRESENT => Some(explain_decision_requested_present()),
        ids::RULE_DECISION_REQUESTED_VALID => Some(explain_decision_requested_valid()),
        ids::RULE_JUSTIFICATION_PRESENT => Some(explain_justification_present()),
        ids::RULE_JUSTIFICATION_NON_EMPTY => Some(explain_justification_non_empty()),
        ids::RULE_APPLY_DECISION => Some(explain_apply_decision()),
        ids::RULE_LEGACY_ASSERT => Some(explain_legacy_assert()),

        // Codes
        ids::CODE_MISSING_DECISION_REQUESTED => Some(explain_decision_requested_present()),
        ids::CODE_INVALID_DECISION_REQUESTED => Some(explain_decision_requested_valid()),
        ids::CODE_MISSING_JUSTIFICATION => Some(explain_justification_present()),
        ids::CODE_EMPTY_JUSTIFICATION => Some(explain_justification_non_empty()),
        ids::CODE_DECISION_RECORDED => Some(explain_apply_decision()),
        ids::CODE_LEGACY_ASSERT_TRUE => Some(explain_legacy_assert()),
        ids::CODE_NO_TERMINAL_RULE => Some(explain_no_terminal_rule()),

        _ => None,
    }
}

/// List all known rule IDs.
pub fn all_rule_ids() -> &'static [&'static str] {
    &[
        ids::RULE_DECISION_REQUESTED_PRESENT,
        ids::RULE_DECISION_REQUESTED_VALID,
        ids::RULE_JUSTIFICATION_PRESENT,
        ids::RULE_JUSTIFICATION_NON_EMPTY,
        ids::RULE_APPLY_DECISION,
        ids::RULE_LEGACY_ASSERT,
    ]
}

/// List all known codes.
pub fn all_codes() -> &'static [&'static str] {
    &[
        ids::CODE_MISSING_DECISION_REQUESTED,
        ids::CODE_INVALID_DECISION_REQUESTED,
        ids::CODE_MISSING_JUSTIFICATION,
        ids::CODE_EMPTY_JUSTIFICATION,
        ids::CODE_DECISION_RECORDED,
        ids::CODE_LEGACY_ASSERT_TRUE,
        ids::CODE_NO_TERMINAL_RULE,
    ]
}

// --- evaluation-policy-v1 ---

fn explain_decision_requested_present() -> Explanation {
    Explanation {
        title: "Decision Requested Present",
        description: "\
The payload must name the decision the caller wants recorded under the key
`decision_requested`. Without it there is nothing to record, so the request is
rejected before any other rule runs.",
        remediation: "\
Add `decision_requested` to the payload with the value `ACCEPT` or `REJECT`.",
        examples: ExamplePayloads {
            before: r#"{"justification": "Vendor passed review"}"#,
            after: r#"{"decision_requested": "ACCEPT", "justification": "Vendor passed review"}"#,
        },
    }
}

fn explain_decision_requested_valid() -> Explanation {
    Explanation {
        title: "Decision Requested Valid",
        description: "\
`decision_requested` must be exactly the string `ACCEPT` or `REJECT`.

No coercion is applied:
- lowercase or mixed case (`accept`) is rejected
- surrounding whitespace (` ACCEPT `) is rejected
- non-string values (`true`, `1`) are rejected",
        remediation: "\
Send the uppercase literal with no padding.",
        examples: ExamplePayloads {
            before: r#"{"decision_requested": "accept", "justification": "ok"}"#,
            after: r#"{"decision_requested": "ACCEPT", "justification": "ok"}"#,
        },
    }
}

fn explain_justification_present() -> Explanation {
    Explanation {
        title: "Justification Present",
        description: "\
Every recorded decision carries a human justification under the key
`justification`. A payload without that key is rejected.",
        remediation: "\
Add `justification` with a short explanation of why the decision was taken.",
        examples: ExamplePayloads {
            before: r#"{"decision_requested": "REJECT"}"#,
            after: r#"{"decision_requested": "REJECT", "justification": "Missing SOC2 report"}"#,
        },
    }
}

fn explain_justification_non_empty() -> Explanation {
    Explanation {
        title: "Justification Non-Empty",
        description: "\
`justification` must be a string with at least one non-whitespace character.
Empty strings, whitespace-only strings and non-string values are rejected.",
        remediation: "\
Write an actual justification.",
        examples: ExamplePayloads {
            before: r#"{"decision_requested": "ACCEPT", "justification": "   "}"#,
            after: r#"{"decision_requested": "ACCEPT", "justification": "Approved by procurement"}"#,
        },
    }
}

fn explain_apply_decision() -> Explanation {
    Explanation {
        title: "Decision Recorded",
        description: "\
Terminal rule. Once every precondition passes, the requested decision is
recorded verbatim as the outcome of the evaluation.",
        remediation: "\
Nothing to fix; this rule reports success.",
        examples: ExamplePayloads {
            before: r#"{"decision_requested": "ACCEPT"}"#,
            after: r#"{"decision_requested": "ACCEPT", "justification": "Approved by procurement"}"#,
        },
    }
}

// --- mvp-placeholder-v0 ---

fn explain_legacy_assert() -> Explanation {
    Explanation {
        title: "Legacy Assert",
        description: "\
Rule table of records created before versioned policies existed. The decision is
ACCEPT iff `payload.assert` is the boolean `true`; anything else is REJECT.

Only used to replay stored records that name this policy.",
        remediation: "\
New requests are evaluated under `evaluation-policy-v1`; send
`decision_requested` and `justification` instead.",
        examples: ExamplePayloads {
            before: r#"{"assert": "true"}"#,
            after: r#"{"assert": true}"#,
        },
    }
}

fn explain_no_terminal_rule() -> Explanation {
    Explanation {
        title: "No Terminal Rule",
        description: "\
A rule table ran to completion without any rule producing a decision. The
evaluator fails closed and records REJECT.",
        remediation: "\
This points at a defective rule table rather than a bad request.",
        examples: ExamplePayloads {
            before: "{}",
            after: r#"{"decision_requested": "ACCEPT", "justification": "ok"}"#,
        },
    }
}
