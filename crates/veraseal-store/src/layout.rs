use camino::{Utf8Path, Utf8PathBuf};
use veraseal_types::{EvaluationId, ids};

/// One of the four files persisted per evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Input,
    Output,
    Trace,
    Metadata,
}

impl ArtifactKind {
    /// Manifest order.
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Input,
        ArtifactKind::Output,
        ArtifactKind::Trace,
        ArtifactKind::Metadata,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Input => ids::FILE_INPUT,
            ArtifactKind::Output => ids::FILE_OUTPUT,
            ArtifactKind::Trace => ids::FILE_TRACE,
            ArtifactKind::Metadata => ids::FILE_METADATA,
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.file_name() == name)
    }
}

/// Paths under an artifact root:
///
/// ```text
/// <root>/evaluations/<id>/{input,output,trace,metadata}.json
/// <root>/manifests/<id>.manifest.json
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: Utf8PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn evaluations_dir(&self) -> Utf8PathBuf {
        self.root.join(ids::DIR_EVALUATIONS)
    }

    pub fn manifests_dir(&self) -> Utf8PathBuf {
        self.root.join(ids::DIR_MANIFESTS)
    }

    pub fn evaluation_dir(&self, id: &EvaluationId) -> Utf8PathBuf {
        self.evaluations_dir().join(id.as_str())
    }

    pub fn artifact_path(&self, id: &EvaluationId, kind: ArtifactKind) -> Utf8PathBuf {
        self.evaluation_dir(id).join(kind.file_name())
    }

    pub fn manifest_path(&self, id: &EvaluationId) -> Utf8PathBuf {
        self.manifests_dir()
            .join(format!("{}{}", id.as_str(), ids::MANIFEST_SUFFIX))
    }
}
