use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `veraseal.toml` schema v1.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct VerasealConfigV1 {
    /// Optional schema string for tooling (`veraseal.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Directory holding `evaluations/` and `manifests/`. Defaults to `artifacts`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_root: Option<String>,

    /// Rule table applied to new submissions. Must be a current (non-legacy) policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,

    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum `subject` length in characters (1..=4096).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_subject_len: Option<u32>,

    /// Maximum `ruleset` length in characters (1..=4096).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ruleset_len: Option<u32>,
}
