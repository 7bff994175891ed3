use thiserror::Error;

/// A value could not be reduced to canonical JSON.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CanonicalizationError {
    #[error("{path}: NaN and Infinity are not representable in canonical JSON")]
    NonFiniteNumber { path: String },

    #[error("{path}: mapping keys must be strings")]
    NonStringKey { path: String },

    #[error("{path}: {kind} is not a JSON-compatible type")]
    UnsupportedType { path: String, kind: &'static str },

    #[error("{0}")]
    Message(String),
}

impl serde::ser::Error for CanonicalizationError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        CanonicalizationError::Message(msg.to_string())
    }
}

/// The request envelope failed PRE validation. Never stored.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("request is not valid JSON: {0}")]
    Malformed(String),

    #[error("request must be a JSON object")]
    NotAnObject,

    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("unrecognized field '{field}'")]
    UnknownField { field: String },

    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unsupported version '{found}', expected '{expected}'")]
    UnsupportedVersion {
        found: String,
        expected: &'static str,
    },

    #[error("field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    #[error("field '{field}' is {len} characters, maximum is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("injected_time_utc '{value}' is not a UTC RFC 3339 timestamp: {detail}")]
    InvalidTimestamp { value: String, detail: String },

    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),
}

/// A POST check failed: the engine produced an invalid result from a valid request.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("POST invariant '{check}' violated: {detail}")]
pub struct InvariantViolation {
    pub check: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}
