//! Shared test utilities for the VeraSeal workspace.
//!
//! This crate exists because integration tests in several crates and `xtask` need the same
//! request fixtures, and because tamper helpers must bypass the store API: the store never
//! offers a way to modify a record.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value, json};
use std::fs;
use std::io;
use veraseal_domain::{canonicalize_value, sha256_hex};
use veraseal_types::EvaluationRequest;

pub const FIXED_TIME: &str = "2024-01-15T10:30:00Z";
pub const SUBJECT: &str = "vendor-approval";
pub const RULESET: &str = "procurement-v1";

/// Unwrap a `json!` object literal into a payload map.
///
/// Panics on anything else; fixtures are always written as object literals.
pub fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("payload fixture must be an object, got {other}"),
    }
}

pub fn request(value: Value) -> EvaluationRequest {
    EvaluationRequest::v1(SUBJECT, RULESET, payload(value), FIXED_TIME)
}

pub fn accept_payload() -> Value {
    json!({
        "decision_requested": "ACCEPT",
        "justification": "Vendor passed due diligence."
    })
}

/// The canonical ACCEPT request: all five rules pass.
pub fn accept_request() -> EvaluationRequest {
    request(accept_payload())
}

/// Same request with a different injected time, hence a different evaluation id.
pub fn accept_request_at(time: &str) -> EvaluationRequest {
    EvaluationRequest::v1(SUBJECT, RULESET, payload(accept_payload()), time)
}

/// Envelope JSON for `request`, as a transport would receive it.
pub fn envelope_bytes(request: &EvaluationRequest) -> Vec<u8> {
    match serde_json::to_vec(request) {
        Ok(bytes) => bytes,
        Err(e) => panic!("request fixture does not serialize: {e}"),
    }
}

/// Rewrite one top-level field of a stored JSON file in place, keeping it canonical.
///
/// `None` removes the field.
pub fn rewrite_json_field(path: &Utf8Path, field: &str, value: Option<Value>) -> io::Result<()> {
    let bytes = fs::read(path)?;
    let mut document: Value = serde_json::from_slice(&bytes).map_err(io::Error::other)?;
    let object = document
        .as_object_mut()
        .ok_or_else(|| io::Error::other(format!("{path} is not a JSON object")))?;
    match value {
        Some(value) => {
            object.insert(field.to_string(), value);
        }
        None => {
            object.remove(field);
        }
    }
    fs::write(path, canonicalize_value(&document))
}

/// `(file name, sha256)` for every regular file directly under `dir`, sorted by name.
pub fn hash_dir(dir: &Utf8Path) -> io::Result<Vec<(String, String)>> {
    let mut hashes = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            let name = entry.file_name().to_string_lossy().into_owned();
            hashes.push((name, sha256_hex(&fs::read(entry.path())?)));
        }
    }
    hashes.sort();
    Ok(hashes)
}

/// UTF-8 path of a temp directory.
pub fn utf8_path(path: &std::path::Path) -> Utf8PathBuf {
    match Utf8PathBuf::from_path_buf(path.to_path_buf()) {
        Ok(path) => path,
        Err(path) => panic!("temp path is not UTF-8: {}", path.display()),
    }
}
