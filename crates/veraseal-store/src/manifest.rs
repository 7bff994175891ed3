use serde::Serialize;
use veraseal_domain::{CanonicalizationError, canonicalize, sha256_hex};
use veraseal_types::{Manifest, ManifestEntry};

#[derive(Serialize)]
struct ManifestBody<'a> {
    evaluation_id: &'a str,
    files: &'a [ManifestEntry],
}

/// `sha256(canonical({evaluation_id, files}))`.
pub fn manifest_hash(
    evaluation_id: &str,
    files: &[ManifestEntry],
) -> Result<String, CanonicalizationError> {
    let body = canonicalize(&ManifestBody {
        evaluation_id,
        files,
    })?;
    Ok(sha256_hex(&body))
}

pub fn entry_for(name: &str, bytes: &[u8]) -> ManifestEntry {
    ManifestEntry {
        name: name.to_string(),
        sha256: sha256_hex(bytes),
        size: bytes.len() as u64,
    }
}

/// Build a manifest over `(name, bytes)` pairs, keeping their order.
pub fn build_manifest(
    evaluation_id: &str,
    files: &[(&str, &[u8])],
) -> Result<Manifest, CanonicalizationError> {
    let files: Vec<ManifestEntry> = files
        .iter()
        .map(|(name, bytes)| entry_for(name, bytes))
        .collect();
    let manifest_sha256 = manifest_hash(evaluation_id, &files)?;
    Ok(Manifest {
        evaluation_id: evaluation_id.to_string(),
        files,
        manifest_sha256,
    })
}

/// Compare a stored manifest with freshly hashed files. Empty means consistent.
pub fn compare_manifest(
    manifest: &Manifest,
    evaluation_id: &str,
    files: &[(&str, &[u8])],
) -> Vec<String> {
    let mut problems = Vec::new();

    if manifest.evaluation_id != evaluation_id {
        problems.push(format!(
            "manifest evaluation_id mismatch: saved={}, expected={evaluation_id}",
            manifest.evaluation_id
        ));
    }

    let actual: Vec<ManifestEntry> = files
        .iter()
        .map(|(name, bytes)| entry_for(name, bytes))
        .collect();

    for entry in &actual {
        match manifest.entry(&entry.name) {
            None => problems.push(format!("{} missing from manifest", entry.name)),
            Some(saved) => {
                if saved.sha256 != entry.sha256 {
                    problems.push(format!(
                        "{} sha256 mismatch: saved={}, actual={}",
                        entry.name, saved.sha256, entry.sha256
                    ));
                }
                if saved.size != entry.size {
                    problems.push(format!(
                        "{} size mismatch: saved={}, actual={}",
                        entry.name, saved.size, entry.size
                    ));
                }
            }
        }
    }

    for saved in &manifest.files {
        if !actual.iter().any(|a| a.name == saved.name) {
            problems.push(format!("{} listed in manifest but not present", saved.name));
        }
    }

    match manifest_hash(&manifest.evaluation_id, &manifest.files) {
        Ok(hash) if hash == manifest.manifest_sha256 => {}
        Ok(hash) => problems.push(format!(
            "manifest_sha256 mismatch: saved={}, recomputed={hash}",
            manifest.manifest_sha256
        )),
        Err(e) => problems.push(format!("manifest cannot be canonicalized: {e}")),
    }

    problems
}
