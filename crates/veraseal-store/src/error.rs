use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;
use veraseal_domain::CanonicalizationError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Something already exists for this evaluation id. Nothing was written.
    #[error("evaluation {evaluation_id} already exists; records are append-only")]
    AppendOnlyViolation { evaluation_id: String },

    #[error("evaluation {evaluation_id} not found")]
    NotFound { evaluation_id: String },

    /// The evaluation directory exists but a file is missing.
    #[error("evaluation {evaluation_id} is incomplete: {file} is missing")]
    Incomplete { evaluation_id: String, file: String },

    #[error("{path} is corrupt: {detail}")]
    Corrupt { path: Utf8PathBuf, detail: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),
}

impl StoreError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            source,
        }
    }
}
