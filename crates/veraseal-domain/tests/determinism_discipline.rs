//! Static scan of the domain sources.
//!
//! Evaluation must be a pure function of the request and the rule table, so the domain
//! crate may not name wall-clock, randomness, environment or filesystem APIs anywhere.

use std::path::Path;
use walkdir::WalkDir;

const FORBIDDEN: &[&str] = &[
    "SystemTime",
    "Instant::now",
    "OffsetDateTime::now",
    "Utc::now",
    "Local::now",
    "thread_rng",
    "rand::",
    "getrandom",
    "std::fs",
    "File::create",
    "File::open",
    "std::env",
    "std::net",
    "std::process",
];

#[test]
fn domain_sources_never_name_ambient_apis() {
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut scanned = 0usize;
    let mut violations = Vec::new();

    for entry in WalkDir::new(&src).sort_by_file_name() {
        let entry = entry.expect("walk domain sources");
        if entry.path().extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }
        scanned += 1;
        let text = std::fs::read_to_string(entry.path()).expect("read source file");
        for (line_no, line) in text.lines().enumerate() {
            for token in FORBIDDEN {
                if line.contains(token) {
                    violations.push(format!(
                        "{}:{}: `{token}`",
                        entry.path().display(),
                        line_no + 1
                    ));
                }
            }
        }
    }

    assert!(scanned >= 5, "expected to scan the domain sources, found {scanned} files");
    assert!(
        violations.is_empty(),
        "ambient API use in veraseal-domain:\n{}",
        violations.join("\n")
    );
}

#[test]
fn domain_manifest_pulls_no_clock_or_rng_crates() {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
    let text = std::fs::read_to_string(manifest).expect("read Cargo.toml");
    let deps = text
        .split("[dev-dependencies]")
        .next()
        .unwrap_or_default();
    for crate_name in ["rand", "chrono", "uuid", "getrandom"] {
        assert!(
            !deps
                .lines()
                .any(|l| l.trim_start().starts_with(&format!("{crate_name} "))
                    || l.trim_start().starts_with(&format!("{crate_name}."))),
            "veraseal-domain must not depend on `{crate_name}`"
        );
    }
}
