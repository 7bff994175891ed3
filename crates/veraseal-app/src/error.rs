use thiserror::Error;
use veraseal_domain::{EngineError, EnvelopeError, InvariantViolation};
use veraseal_store::StoreError;

/// Coarse outcome class for a transport layer to map onto its own status signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The request envelope was rejected before evaluation.
    Malformed,
    /// The evaluation id already has stored artifacts.
    Conflict,
    /// No record exists under the given id.
    NotFound,
    /// A defect or an environment failure. Not the caller's fault.
    Internal,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("malformed request: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("{0}")]
    Invariant(#[from] InvariantViolation),

    #[error("evaluation {evaluation_id} is already recorded")]
    Conflict { evaluation_id: String },

    #[error("storage failure: {0}")]
    Store(StoreError),
}

impl SubmitError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Envelope(_) => ErrorClass::Malformed,
            Self::Conflict { .. } => ErrorClass::Conflict,
            Self::Invariant(_) | Self::Store(_) => ErrorClass::Internal,
        }
    }
}

impl From<EngineError> for SubmitError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Envelope(e) => Self::Envelope(e),
            EngineError::Invariant(e) => Self::Invariant(e),
        }
    }
}

impl From<StoreError> for SubmitError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AppendOnlyViolation { evaluation_id } => Self::Conflict { evaluation_id },
            other => Self::Store(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("evaluation {evaluation_id} not found")]
    NotFound { evaluation_id: String },

    #[error("stored {file} for evaluation {evaluation_id} is unreadable: {detail}")]
    Corrupt {
        evaluation_id: String,
        file: String,
        detail: String,
    },

    #[error(transparent)]
    Store(StoreError),
}

impl LookupError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Corrupt { .. } | Self::Store(_) => ErrorClass::Internal,
        }
    }
}

impl From<StoreError> for LookupError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { evaluation_id } => Self::NotFound { evaluation_id },
            other => Self::Store(other),
        }
    }
}

/// Replay failures. A replay that finds discrepancies is not an error; see `ReplayReport`.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("evaluation {evaluation_id} not found")]
    NotFound { evaluation_id: String },

    #[error("{0}")]
    Invariant(#[from] InvariantViolation),

    #[error(transparent)]
    Store(StoreError),
}

impl ReplayError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Invariant(_) | Self::Store(_) => ErrorClass::Internal,
        }
    }
}

impl From<StoreError> for ReplayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { evaluation_id } => Self::NotFound { evaluation_id },
            other => Self::Store(other),
        }
    }
}
