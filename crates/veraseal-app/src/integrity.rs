//! The integrity audit: re-hash stored files against their manifest. Read-only.

use tracing::{info, warn};
use veraseal_store::{ArtifactKind, StoreError, manifest::compare_manifest};
use veraseal_types::{IntegrityReport, ids};

use crate::error::LookupError;
use crate::recorder::{Recorder, lookup_id};

impl Recorder {
    /// Compare every stored file's name, size and digest with the manifest, and recompute the
    /// manifest's own digest. Missing files or manifest are problems, not errors.
    pub fn verify_integrity(&self, id: &str) -> Result<IntegrityReport, LookupError> {
        let id = lookup_id(id)?;
        let store = self.store();

        let mut present: Vec<(&'static str, Vec<u8>)> = Vec::new();
        let mut problems = Vec::new();
        for kind in ArtifactKind::ALL {
            match store.read_artifact(&id, kind) {
                Ok(bytes) => present.push((kind.file_name(), bytes)),
                Err(StoreError::Incomplete { file, .. }) => {
                    problems.push(format!("{file} missing"));
                }
                Err(other) => return Err(other.into()),
            }
        }

        match store.manifest(&id) {
            Ok(manifest) => {
                let files: Vec<(&str, &[u8])> = present
                    .iter()
                    .map(|(name, bytes)| (*name, bytes.as_slice()))
                    .collect();
                let found: Vec<String> = compare_manifest(&manifest, id.as_str(), &files)
                    .into_iter()
                    .filter(|p| !is_reported_missing(p, &problems))
                    .collect();
                problems.extend(found);
            }
            Err(StoreError::Incomplete { .. }) => {
                problems.push(format!("{id}{} missing", ids::MANIFEST_SUFFIX));
            }
            Err(StoreError::Corrupt { detail, .. }) => {
                problems.push(format!("{id}{} unreadable: {detail}", ids::MANIFEST_SUFFIX));
            }
            Err(other) => return Err(other.into()),
        }

        let report = IntegrityReport::from_problems(id.as_str(), problems);
        if report.ok {
            info!(evaluation_id = %id, "integrity verified");
        } else {
            warn!(
                evaluation_id = %id,
                problems = report.problems.len(),
                "integrity check failed"
            );
        }
        Ok(report)
    }
}

/// A file already reported missing need not be reported again as absent from disk.
fn is_reported_missing(problem: &str, problems: &[String]) -> bool {
    problems.iter().any(|p| {
        p.strip_suffix(" missing")
            .is_some_and(|file| problem == format!("{file} listed in manifest but not present"))
    })
}
