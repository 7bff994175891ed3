use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of re-deriving a stored evaluation.
///
/// `ok` is true iff `mismatches` is empty. A failed replay is a normal result, not an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReplayReport {
    pub evaluation_id: String,
    pub ok: bool,
    pub mismatches: Vec<String>,
}

impl ReplayReport {
    pub fn from_mismatches(evaluation_id: &str, mismatches: Vec<String>) -> Self {
        Self {
            evaluation_id: evaluation_id.to_string(),
            ok: mismatches.is_empty(),
            mismatches,
        }
    }
}

/// Outcome of re-hashing stored files against their manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IntegrityReport {
    pub evaluation_id: String,
    pub ok: bool,
    pub problems: Vec<String>,
}

impl IntegrityReport {
    pub fn from_problems(evaluation_id: &str, problems: Vec<String>) -> Self {
        Self {
            evaluation_id: evaluation_id.to_string(),
            ok: problems.is_empty(),
            problems,
        }
    }
}
