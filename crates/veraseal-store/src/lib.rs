//! Append-only artifact store.
//!
//! Each evaluation is claimed by atomically creating its directory; whoever creates it owns
//! the id. Files are written create-only through a temp-file-and-rename protocol, and the
//! manifest lands in a separate namespace after all four files are durable. There is no
//! update or delete operation.

#![forbid(unsafe_code)]

mod atomic;
mod error;
mod layout;
pub mod manifest;

pub use error::StoreError;
pub use layout::{ArtifactKind, ArtifactLayout};

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use tracing::{info, warn};
use veraseal_domain::{ArtifactSet, canonicalize};
use veraseal_types::{EvaluationId, Manifest};

use crate::atomic::{sync_dir, write_new_durable};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Create-only file writer used by `persist`.
type WriteFn = fn(&Utf8Path, &[u8]) -> io::Result<()>;

#[derive(Clone, Debug)]
pub struct ArtifactStore {
    layout: ArtifactLayout,
}

impl ArtifactStore {
    /// Open (and if needed create) an artifact root, then prove it is writable.
    pub fn open(root: impl Into<Utf8PathBuf>) -> Result<Self> {
        let layout = ArtifactLayout::new(root);

        for dir in [layout.evaluations_dir(), layout.manifests_dir()] {
            fs::create_dir_all(&dir)
                .map_err(|e| StoreError::io(format!("create {dir}"), e))?;
        }

        // Probe: the temp file is removed when dropped.
        tempfile::NamedTempFile::new_in(layout.root())
            .map_err(|e| StoreError::io(format!("artifact root {} is not writable", layout.root()), e))?;

        Ok(Self { layout })
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn root(&self) -> &Utf8Path {
        self.layout.root()
    }

    /// Persist the four files of one evaluation exactly once.
    ///
    /// Fails with `AppendOnlyViolation` and no side effects when anything already exists for
    /// `id`. On any other failure, whatever this call created is removed again.
    pub fn persist(&self, id: &EvaluationId, files: &ArtifactSet) -> Result<Manifest> {
        self.persist_with(id, files, write_new_durable)
    }

    fn persist_with(
        &self,
        id: &EvaluationId,
        files: &ArtifactSet,
        write: WriteFn,
    ) -> Result<Manifest> {
        let eval_dir = self.layout.evaluation_dir(id);
        let manifest_path = self.layout.manifest_path(id);

        if path_exists(&manifest_path)? {
            return Err(self.conflict(id));
        }

        // Exclusive claim. Exactly one concurrent caller gets past this line.
        match fs::create_dir(&eval_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(self.conflict(id)),
            Err(e) => return Err(StoreError::io(format!("create {eval_dir}"), e)),
        }

        match self.fill_claimed(id, &eval_dir, &manifest_path, files, write) {
            Ok(manifest) => {
                info!(
                    evaluation_id = %id,
                    manifest_sha256 = %manifest.manifest_sha256,
                    "evaluation persisted"
                );
                Ok(manifest)
            }
            Err(err) => {
                self.roll_back(id, &eval_dir);
                Err(err)
            }
        }
    }

    fn fill_claimed(
        &self,
        id: &EvaluationId,
        eval_dir: &Utf8Path,
        manifest_path: &Utf8Path,
        files: &ArtifactSet,
        write: WriteFn,
    ) -> Result<Manifest> {
        let evaluations_dir = self.layout.evaluations_dir();
        sync_dir(&evaluations_dir)
            .map_err(|e| StoreError::io(format!("sync {evaluations_dir}"), e))?;

        for (name, bytes) in files.files() {
            let path = eval_dir.join(name);
            write(&path, bytes)
                .map_err(|e| StoreError::io(format!("write {path}"), e))?;
        }
        sync_dir(eval_dir).map_err(|e| StoreError::io(format!("sync {eval_dir}"), e))?;

        let manifest = manifest::build_manifest(id.as_str(), &files.files())?;
        let manifest_bytes = canonicalize(&manifest)?;
        match write(manifest_path, &manifest_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(self.conflict(id)),
            Err(e) => return Err(StoreError::io(format!("write {manifest_path}"), e)),
        }
        let manifests_dir = self.layout.manifests_dir();
        sync_dir(&manifests_dir)
            .map_err(|e| StoreError::io(format!("sync {manifests_dir}"), e))?;

        Ok(manifest)
    }

    /// Remove a directory this process claimed but could not complete.
    fn roll_back(&self, id: &EvaluationId, eval_dir: &Utf8Path) {
        match fs::remove_dir_all(eval_dir) {
            Ok(()) => warn!(evaluation_id = %id, "persist failed; claimed directory removed"),
            Err(e) => warn!(
                evaluation_id = %id,
                path = %eval_dir,
                error = %e,
                "persist failed and the claimed directory could not be removed"
            ),
        }
    }

    fn conflict(&self, id: &EvaluationId) -> StoreError {
        warn!(evaluation_id = %id, "append-only violation");
        StoreError::AppendOnlyViolation {
            evaluation_id: id.to_string(),
        }
    }

    /// `true` when anything (directory or manifest) exists for `id`.
    pub fn exists(&self, id: &EvaluationId) -> Result<bool> {
        Ok(path_exists(&self.layout.evaluation_dir(id))?
            || path_exists(&self.layout.manifest_path(id))?)
    }

    /// Raw bytes of one stored file.
    pub fn read_artifact(&self, id: &EvaluationId, kind: ArtifactKind) -> Result<Vec<u8>> {
        let eval_dir = self.layout.evaluation_dir(id);
        if !path_exists(&eval_dir)? {
            return Err(StoreError::NotFound {
                evaluation_id: id.to_string(),
            });
        }
        let path = eval_dir.join(kind.file_name());
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::Incomplete {
                evaluation_id: id.to_string(),
                file: kind.file_name().to_string(),
            },
            _ => StoreError::io(format!("read {path}"), e),
        })
    }

    /// Raw bytes of all four stored files.
    pub fn load(&self, id: &EvaluationId) -> Result<ArtifactSet> {
        Ok(ArtifactSet {
            input: self.read_artifact(id, ArtifactKind::Input)?,
            output: self.read_artifact(id, ArtifactKind::Output)?,
            trace: self.read_artifact(id, ArtifactKind::Trace)?,
            metadata: self.read_artifact(id, ArtifactKind::Metadata)?,
        })
    }

    pub fn manifest(&self, id: &EvaluationId) -> Result<Manifest> {
        let path = self.layout.manifest_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(if path_exists(&self.layout.evaluation_dir(id))? {
                    StoreError::Incomplete {
                        evaluation_id: id.to_string(),
                        file: format!("{}{}", id, veraseal_types::ids::MANIFEST_SUFFIX),
                    }
                } else {
                    StoreError::NotFound {
                        evaluation_id: id.to_string(),
                    }
                });
            }
            Err(e) => return Err(StoreError::io(format!("read {path}"), e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            path,
            detail: e.to_string(),
        })
    }
}

fn path_exists(path: &Utf8Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::io(format!("stat {path}"), e)),
    }
}
