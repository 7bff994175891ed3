use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Length of an evaluation id: the leading hex characters of the input digest.
pub const EVALUATION_ID_LEN: usize = 16;

/// Identifier of one immutable evaluation record.
///
/// Always exactly 16 lowercase hex characters. Parsing is the only way to build one, so an
/// `EvaluationId` is safe to join onto a filesystem path.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(try_from = "String", into = "String")]
pub struct EvaluationId(String);

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid evaluation id '{value}': expected {EVALUATION_ID_LEN} lowercase hex characters")]
pub struct InvalidEvaluationId {
    pub value: String,
}

impl EvaluationId {
    pub fn parse(value: &str) -> Result<Self, InvalidEvaluationId> {
        if is_evaluation_id(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidEvaluationId {
                value: value.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `true` when `value` has the shape of an evaluation id.
pub fn is_evaluation_id(value: &str) -> bool {
    value.len() == EVALUATION_ID_LEN && is_lower_hex(value)
}

/// `true` when `value` has the shape of a SHA-256 hex digest.
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && is_lower_hex(value)
}

fn is_lower_hex(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EvaluationId {
    type Error = InvalidEvaluationId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_evaluation_id(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidEvaluationId { value })
        }
    }
}

impl From<EvaluationId> for String {
    fn from(value: EvaluationId) -> Self {
        value.0
    }
}

impl AsRef<str> for EvaluationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
