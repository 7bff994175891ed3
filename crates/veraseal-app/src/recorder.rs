//! The `submit` and retrieval use cases.

use serde::de::DeserializeOwned;
use tracing::{error, info};
use veraseal_domain::{
    EngineError, EnvelopeLimits, Evaluation, InvariantViolation, evaluate, parse_envelope_slice,
    render_artifacts,
};
use veraseal_settings::ResolvedConfig;
use veraseal_store::{ArtifactKind, ArtifactStore, StoreError};
use veraseal_types::{
    EvaluationId, EvaluationMetadata, EvaluationRequest, EvaluationResult, Manifest, TraceStep,
};

use crate::error::{LookupError, SubmitError};

/// Records evaluations into one artifact root using one resolved configuration.
#[derive(Clone, Debug)]
pub struct Recorder {
    store: ArtifactStore,
    config: ResolvedConfig,
}

/// A freshly recorded evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub evaluation_id: EvaluationId,
    pub result: EvaluationResult,
    pub manifest: Manifest,
}

/// A stored evaluation, parsed back from its four files and manifest.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationRecord {
    pub request: EvaluationRequest,
    pub output: EvaluationResult,
    pub trace: Vec<TraceStep>,
    pub metadata: EvaluationMetadata,
    pub manifest: Manifest,
}

impl Recorder {
    /// Open the configured artifact root. Fails early if it cannot be created or written.
    pub fn open(config: ResolvedConfig) -> Result<Self, StoreError> {
        let store = ArtifactStore::open(config.artifact_root.clone())?;
        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: ArtifactStore, config: ResolvedConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn limits(&self) -> &EnvelopeLimits {
        &self.config.limits
    }

    /// Evaluate a request and persist its artifacts exactly once.
    ///
    /// A policy REJECT is a successful submission. Errors are envelope problems, conflicts
    /// with an existing record, engine defects or storage failures.
    pub fn submit(&self, request: &EvaluationRequest) -> Result<Submission, SubmitError> {
        let evaluation = match evaluate(request, self.config.policy, &self.config.limits) {
            Ok(evaluation) => evaluation,
            Err(EngineError::Invariant(violation)) => return Err(self.defect(violation)),
            Err(other) => return Err(other.into()),
        };
        self.persist(evaluation)
    }

    /// Like [`Recorder::submit`], starting from raw request bytes.
    pub fn submit_json(&self, bytes: &[u8]) -> Result<Submission, SubmitError> {
        let request = parse_envelope_slice(bytes, &self.config.limits)?;
        self.submit(&request)
    }

    fn persist(&self, evaluation: Evaluation) -> Result<Submission, SubmitError> {
        let evaluation_id = EvaluationId::parse(&evaluation.result.evaluation_id).map_err(|e| {
            self.defect(InvariantViolation {
                check: "evaluation_id_format",
                detail: e.to_string(),
            })
        })?;
        let files = render_artifacts(&evaluation).map_err(|v| self.defect(v))?;
        let manifest = self.store.persist(&evaluation_id, &files)?;

        info!(
            evaluation_id = %evaluation_id,
            decision = %evaluation.result.decision,
            policy_id = evaluation.policy.policy_id,
            "evaluation recorded"
        );

        Ok(Submission {
            evaluation_id,
            result: evaluation.result,
            manifest,
        })
    }

    fn defect(&self, violation: InvariantViolation) -> SubmitError {
        error!(
            check = violation.check,
            detail = %violation.detail,
            "internal invariant violated; evaluation not recorded"
        );
        SubmitError::Invariant(violation)
    }

    /// `false` for ids that are not well-formed, without touching the filesystem.
    pub fn exists(&self, id: &str) -> Result<bool, LookupError> {
        match EvaluationId::parse(id) {
            Ok(id) => Ok(self.store.exists(&id)?),
            Err(_) => Ok(false),
        }
    }

    /// Raw bytes of one stored file.
    pub fn read_artifact(&self, id: &str, kind: ArtifactKind) -> Result<Vec<u8>, LookupError> {
        let id = lookup_id(id)?;
        Ok(self.store.read_artifact(&id, kind)?)
    }

    pub fn manifest(&self, id: &str) -> Result<Manifest, LookupError> {
        let id = lookup_id(id)?;
        Ok(self.store.manifest(&id)?)
    }

    /// The full stored record.
    pub fn get(&self, id: &str) -> Result<EvaluationRecord, LookupError> {
        let id = lookup_id(id)?;
        let files = self.store.load(&id)?;
        let manifest = self.store.manifest(&id)?;

        Ok(EvaluationRecord {
            request: parse_stored(&id, ArtifactKind::Input, &files.input)?,
            output: parse_stored(&id, ArtifactKind::Output, &files.output)?,
            trace: parse_stored(&id, ArtifactKind::Trace, &files.trace)?,
            metadata: parse_stored(&id, ArtifactKind::Metadata, &files.metadata)?,
            manifest,
        })
    }
}

/// Malformed ids can never name a record, so they are reported as not found.
pub(crate) fn lookup_id(id: &str) -> Result<EvaluationId, LookupError> {
    EvaluationId::parse(id).map_err(|_| LookupError::NotFound {
        evaluation_id: id.to_string(),
    })
}

fn parse_stored<T: DeserializeOwned>(
    id: &EvaluationId,
    kind: ArtifactKind,
    bytes: &[u8],
) -> Result<T, LookupError> {
    serde_json::from_slice(bytes).map_err(|e| LookupError::Corrupt {
        evaluation_id: id.to_string(),
        file: kind.file_name().to_string(),
        detail: e.to_string(),
    })
}
