use camino::Utf8PathBuf;
use serde_json::{Map, Value, json};
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use veraseal_domain::{
    ArtifactSet, EnvelopeLimits, PolicyChoice, evaluate, render_artifacts, sha256_hex,
};
use veraseal_store::{ArtifactKind, ArtifactStore, StoreError};
use veraseal_types::{EvaluationId, EvaluationRequest};

fn temp_store() -> (tempfile::TempDir, ArtifactStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().join("artifacts")).expect("utf-8 path");
    let store = ArtifactStore::open(root).expect("open store");
    (dir, store)
}

fn artifacts(justification: &str) -> (EvaluationId, ArtifactSet) {
    let mut payload = Map::new();
    payload.insert("decision_requested".to_string(), json!("ACCEPT"));
    payload.insert("justification".to_string(), Value::String(justification.to_string()));
    let request = EvaluationRequest::v1("vendor", "procurement", payload, "2024-01-15T10:30:00Z");
    let evaluation =
        evaluate(&request, PolicyChoice::Current, &EnvelopeLimits::default()).expect("evaluate");
    let id = EvaluationId::parse(&evaluation.result.evaluation_id).expect("id");
    (id, render_artifacts(&evaluation).expect("render"))
}

fn file_hashes(store: &ArtifactStore, id: &EvaluationId) -> Vec<String> {
    ArtifactKind::ALL
        .into_iter()
        .map(|kind| sha256_hex(&store.read_artifact(id, kind).expect("read")))
        .collect()
}

fn dir_entries(path: &camino::Utf8Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(path)
        .expect("read_dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn persist_writes_four_files_and_a_manifest() {
    let (_guard, store) = temp_store();
    let (id, files) = artifacts("ok");

    let manifest = store.persist(&id, &files).expect("persist");

    assert_eq!(
        dir_entries(&store.layout().evaluation_dir(&id)),
        ["input.json", "metadata.json", "output.json", "trace.json"]
    );
    let names: Vec<&str> = manifest.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        ["input.json", "output.json", "trace.json", "metadata.json"]
    );
    assert_eq!(manifest.files[0].sha256, sha256_hex(&files.input));
    assert_eq!(manifest.files[1].size, files.output.len() as u64);
    assert_eq!(store.manifest(&id).expect("read manifest"), manifest);
    assert!(store.layout().manifest_path(&id).exists());
    assert!(store.exists(&id).expect("exists"));
    assert_eq!(store.load(&id).expect("load"), files);
}

#[test]
fn second_persist_is_an_append_only_violation_without_side_effects() {
    let (_guard, store) = temp_store();
    let (id, files) = artifacts("ok");
    store.persist(&id, &files).expect("first persist");
    let before = file_hashes(&store, &id);
    let manifest_before = fs::read(store.layout().manifest_path(&id)).expect("manifest");

    let mut different = files.clone();
    different.output = b"{\"forged\":true}".to_vec();
    let err = store.persist(&id, &different).expect_err("second persist");

    assert!(matches!(err, StoreError::AppendOnlyViolation { .. }));
    assert_eq!(file_hashes(&store, &id), before);
    assert_eq!(
        fs::read(store.layout().manifest_path(&id)).expect("manifest"),
        manifest_before
    );
    assert_eq!(dir_entries(&store.layout().evaluation_dir(&id)).len(), 4);
}

#[test]
fn existing_directory_blocks_persist() {
    let (_guard, store) = temp_store();
    let (id, files) = artifacts("ok");
    fs::create_dir(store.layout().evaluation_dir(&id)).expect("pre-create");

    let err = store.persist(&id, &files).expect_err("conflict");
    assert!(matches!(err, StoreError::AppendOnlyViolation { .. }));
    assert!(dir_entries(&store.layout().evaluation_dir(&id)).is_empty());
    assert!(!store.layout().manifest_path(&id).exists());
}

#[test]
fn orphan_manifest_blocks_persist() {
    let (_guard, store) = temp_store();
    let (id, files) = artifacts("ok");
    fs::write(store.layout().manifest_path(&id), b"{}").expect("plant manifest");

    let err = store.persist(&id, &files).expect_err("conflict");
    assert!(matches!(err, StoreError::AppendOnlyViolation { .. }));
    assert!(!store.layout().evaluation_dir(&id).exists());
}

#[test]
fn concurrent_identical_submissions_have_exactly_one_winner() {
    let (_guard, store) = temp_store();
    let (id, files) = artifacts("race");
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let store = store.clone();
            let id = id.clone();
            let files = files.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.persist(&id, &files)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::AppendOnlyViolation { .. })))
        .count();

    assert_eq!(winners, 1);
    assert_eq!(conflicts, threads - 1);
    assert_eq!(store.load(&id).expect("load"), files);
    assert_eq!(
        dir_entries(&store.layout().evaluation_dir(&id)),
        ["input.json", "metadata.json", "output.json", "trace.json"]
    );
}

#[test]
fn unknown_id_is_not_found() {
    let (_guard, store) = temp_store();
    let id = EvaluationId::parse("00000000deadbeef").expect("id");
    assert!(!store.exists(&id).expect("exists"));
    assert!(matches!(
        store.read_artifact(&id, ArtifactKind::Output),
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(store.manifest(&id), Err(StoreError::NotFound { .. })));
}

#[test]
fn missing_file_is_reported_as_incomplete() {
    let (_guard, store) = temp_store();
    let (id, files) = artifacts("ok");
    store.persist(&id, &files).expect("persist");
    fs::remove_file(store.layout().artifact_path(&id, ArtifactKind::Trace)).expect("remove");

    assert!(matches!(
        store.load(&id),
        Err(StoreError::Incomplete { ref file, .. }) if file == "trace.json"
    ));
}

#[test]
fn corrupt_manifest_is_reported() {
    let (_guard, store) = temp_store();
    let (id, files) = artifacts("ok");
    store.persist(&id, &files).expect("persist");
    fs::write(store.layout().manifest_path(&id), b"not json").expect("overwrite");

    assert!(matches!(store.manifest(&id), Err(StoreError::Corrupt { .. })));
}

#[test]
fn open_creates_layout_and_leaves_no_probe() {
    let (_guard, store) = temp_store();
    assert!(store.layout().evaluations_dir().is_dir());
    assert!(store.layout().manifests_dir().is_dir());
    assert_eq!(dir_entries(store.root()), ["evaluations", "manifests"]);
}

#[test]
fn open_fails_when_root_is_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("not-a-dir");
    fs::write(&file, b"x").expect("write");
    let root = Utf8PathBuf::from_path_buf(file).expect("utf-8");
    assert!(matches!(ArtifactStore::open(root), Err(StoreError::Io { .. })));
}
