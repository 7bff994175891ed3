use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One persisted file of an evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ManifestEntry {
    pub name: String,
    pub sha256: String,
    pub size: u64,
}

/// Hash-and-size inventory of an evaluation's four files.
///
/// `manifest_sha256` is the digest of the canonical form of `{evaluation_id, files}`;
/// it is stored alongside but never hashed into itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Manifest {
    pub evaluation_id: String,
    pub files: Vec<ManifestEntry>,
    pub manifest_sha256: String,
}

impl Manifest {
    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.files.iter().find(|f| f.name == name)
    }
}
