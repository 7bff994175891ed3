//! Stable identifiers for policies, rules, reason codes and artifact names.
//!
//! `rule_id` is a short tag (`R001`). `code` is an upper snake case discriminator
//! embedded in reason strings as `<rule_id>:<code>: <text>`.

// Envelope
pub const ENVELOPE_VERSION_V1: &str = "v1";

// Policies
pub const POLICY_EVALUATION_V1: &str = "evaluation-policy-v1";
pub const POLICY_EVALUATION_V1_VERSION: &str = "1.0.0";
pub const POLICY_LEGACY_MVP: &str = "mvp-placeholder-v0";
pub const POLICY_LEGACY_MVP_VERSION: &str = "0.0.0";

// Rules: evaluation-policy-v1
pub const RULE_DECISION_REQUESTED_PRESENT: &str = "R001";
pub const RULE_DECISION_REQUESTED_VALID: &str = "R002";
pub const RULE_JUSTIFICATION_PRESENT: &str = "R003";
pub const RULE_JUSTIFICATION_NON_EMPTY: &str = "R004";
pub const RULE_APPLY_DECISION: &str = "R005";

// Rules: mvp-placeholder-v0
pub const RULE_LEGACY_ASSERT: &str = "LEGACY";

// Codes: evaluation-policy-v1
pub const CODE_MISSING_DECISION_REQUESTED: &str = "MISSING_DECISION_REQUESTED";
pub const CODE_INVALID_DECISION_REQUESTED: &str = "INVALID_DECISION_REQUESTED";
pub const CODE_MISSING_JUSTIFICATION: &str = "MISSING_JUSTIFICATION";
pub const CODE_EMPTY_JUSTIFICATION: &str = "EMPTY_JUSTIFICATION";
pub const CODE_DECISION_RECORDED: &str = "DECISION_RECORDED";

// Codes: mvp-placeholder-v0
pub const CODE_LEGACY_ASSERT_TRUE: &str = "ASSERT_TRUE";

// Codes: evaluator-level
pub const CODE_NO_TERMINAL_RULE: &str = "NO_TERMINAL_RULE";

// Payload keys read by the rule tables
pub const KEY_DECISION_REQUESTED: &str = "decision_requested";
pub const KEY_JUSTIFICATION: &str = "justification";
pub const KEY_LEGACY_ASSERT: &str = "assert";

// Artifact layout
pub const DIR_EVALUATIONS: &str = "evaluations";
pub const DIR_MANIFESTS: &str = "manifests";
pub const FILE_INPUT: &str = "input.json";
pub const FILE_OUTPUT: &str = "output.json";
pub const FILE_TRACE: &str = "trace.json";
pub const FILE_METADATA: &str = "metadata.json";
pub const MANIFEST_SUFFIX: &str = ".manifest.json";

// Schemas
pub const SCHEMA_CONFIG_V1: &str = "veraseal.config.v1";
