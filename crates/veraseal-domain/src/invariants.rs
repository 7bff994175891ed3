//! PRE and POST guards around evaluation.
//!
//! PRE failures are caller errors (`EnvelopeError`). POST failures are engine defects
//! (`InvariantViolation`) and must never be confused with a REJECT.

use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use veraseal_types::{EvaluationRequest, EvaluationResult, ids, is_sha256_hex};

use crate::canonical::derive_id;
use crate::error::{EnvelopeError, InvariantViolation};

pub const DEFAULT_MAX_FIELD_LEN: usize = 128;

const FIELD_VERSION: &str = "version";
const FIELD_SUBJECT: &str = "subject";
const FIELD_RULESET: &str = "ruleset";
const FIELD_PAYLOAD: &str = "payload";
const FIELD_INJECTED_TIME: &str = "injected_time_utc";

const ENVELOPE_FIELDS: &[&str] = &[
    FIELD_VERSION,
    FIELD_SUBJECT,
    FIELD_RULESET,
    FIELD_PAYLOAD,
    FIELD_INJECTED_TIME,
];

/// Length bounds for the free-text envelope fields, counted in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnvelopeLimits {
    pub max_subject_len: usize,
    pub max_ruleset_len: usize,
}

impl Default for EnvelopeLimits {
    fn default() -> Self {
        Self {
            max_subject_len: DEFAULT_MAX_FIELD_LEN,
            max_ruleset_len: DEFAULT_MAX_FIELD_LEN,
        }
    }
}

/// Parse raw request bytes into a PRE-valid request.
pub fn parse_envelope_slice(
    bytes: &[u8],
    limits: &EnvelopeLimits,
) -> Result<EvaluationRequest, EnvelopeError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
    parse_envelope(&value, limits)
}

/// Build a PRE-valid request from a JSON value. No field is coerced to another type.
pub fn parse_envelope(
    value: &Value,
    limits: &EnvelopeLimits,
) -> Result<EvaluationRequest, EnvelopeError> {
    let object = value.as_object().ok_or(EnvelopeError::NotAnObject)?;

    if let Some(unknown) = object
        .keys()
        .find(|k| !ENVELOPE_FIELDS.contains(&k.as_str()))
    {
        return Err(EnvelopeError::UnknownField {
            field: unknown.clone(),
        });
    }

    let request = EvaluationRequest {
        version: string_field(object, FIELD_VERSION)?,
        subject: string_field(object, FIELD_SUBJECT)?,
        ruleset: string_field(object, FIELD_RULESET)?,
        payload: object_field(object, FIELD_PAYLOAD)?,
        injected_time_utc: string_field(object, FIELD_INJECTED_TIME)?,
    };

    check_pre(&request, limits)?;
    Ok(request)
}

fn required<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, EnvelopeError> {
    object.get(field).ok_or(EnvelopeError::MissingField { field })
}

fn string_field(object: &Map<String, Value>, field: &'static str) -> Result<String, EnvelopeError> {
    required(object, field)?
        .as_str()
        .map(str::to_string)
        .ok_or(EnvelopeError::WrongType {
            field,
            expected: "a string",
        })
}

fn object_field(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Map<String, Value>, EnvelopeError> {
    required(object, field)?
        .as_object()
        .cloned()
        .ok_or(EnvelopeError::WrongType {
            field,
            expected: "an object",
        })
}

/// PRE phase. Runs before anything is hashed or evaluated.
pub fn check_pre(request: &EvaluationRequest, limits: &EnvelopeLimits) -> Result<(), EnvelopeError> {
    if request.version != ids::ENVELOPE_VERSION_V1 {
        return Err(EnvelopeError::UnsupportedVersion {
            found: request.version.clone(),
            expected: ids::ENVELOPE_VERSION_V1,
        });
    }

    check_bounded(FIELD_SUBJECT, &request.subject, limits.max_subject_len)?;
    check_bounded(FIELD_RULESET, &request.ruleset, limits.max_ruleset_len)?;

    if request.injected_time_utc.is_empty() {
        return Err(EnvelopeError::EmptyField {
            field: FIELD_INJECTED_TIME,
        });
    }
    parse_utc_timestamp(&request.injected_time_utc)?;

    Ok(())
}

fn check_bounded(field: &'static str, value: &str, max: usize) -> Result<(), EnvelopeError> {
    if value.is_empty() {
        return Err(EnvelopeError::EmptyField { field });
    }
    let len = value.chars().count();
    if len > max {
        return Err(EnvelopeError::FieldTooLong { field, len, max });
    }
    Ok(())
}

/// RFC 3339 with a zero UTC offset (`Z` or `+00:00`).
pub fn parse_utc_timestamp(value: &str) -> Result<OffsetDateTime, EnvelopeError> {
    let parsed =
        OffsetDateTime::parse(value, &Rfc3339).map_err(|e| EnvelopeError::InvalidTimestamp {
            value: value.to_string(),
            detail: e.to_string(),
        })?;
    if !parsed.offset().is_utc() {
        return Err(EnvelopeError::InvalidTimestamp {
            value: value.to_string(),
            detail: format!("offset {} is not UTC", parsed.offset()),
        });
    }
    Ok(parsed)
}

/// POST phase. A failure here is an engine defect, never a property of the request.
pub fn check_post(result: &EvaluationResult) -> Result<(), InvariantViolation> {
    if !is_sha256_hex(&result.input_sha256) {
        return Err(InvariantViolation {
            check: "input_hash_format",
            detail: format!("input_sha256 '{}' is not 64 lowercase hex", result.input_sha256),
        });
    }
    if !is_sha256_hex(&result.output_sha256) {
        return Err(InvariantViolation {
            check: "output_hash_format",
            detail: format!(
                "output_sha256 '{}' is not 64 lowercase hex",
                result.output_sha256
            ),
        });
    }
    let expected_id = derive_id(&result.input_sha256);
    if result.evaluation_id != expected_id {
        return Err(InvariantViolation {
            check: "evaluation_id_derivation",
            detail: format!(
                "evaluation_id '{}' is not the first 16 chars of input_sha256 ('{expected_id}')",
                result.evaluation_id
            ),
        });
    }
    if result.reasons.is_empty() {
        return Err(InvariantViolation {
            check: "reasons_non_empty",
            detail: "reasons must not be empty".to_string(),
        });
    }
    // `decision` is a two-variant enum; the type already guarantees the literal set.
    Ok(())
}
