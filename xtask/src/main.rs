//! Developer tasks (schema generation, rule coverage, conformance).
//!
//! Keeping this separate keeps tooling dependencies out of the library crates.

use anyhow::{Context, bail};
use schemars::schema_for;
use std::fs;
use std::path::PathBuf;
use veraseal_app::{ArtifactKind, ErrorClass, Recorder, describe_policy};
use veraseal_domain::{EVALUATION_POLICY_V1, LEGACY_MVP_POLICY, PolicyChoice};
use veraseal_settings::ResolvedConfig;
use veraseal_types::explain;

/// Project root (parent of the xtask directory).
fn project_root() -> anyhow::Result<PathBuf> {
    let manifest_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => std::env::current_dir().context("Cannot determine current directory")?,
    };

    if manifest_dir.ends_with("xtask") {
        manifest_dir
            .parent()
            .map(PathBuf::from)
            .context("xtask has no parent")
    } else {
        Ok(manifest_dir)
    }
}

fn schemas_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("schemas"))
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "veraseal.request.v1.json",
            generate: || schema_for!(veraseal_types::EvaluationRequest),
        },
        SchemaSpec {
            filename: "veraseal.output.v1.json",
            generate: || schema_for!(veraseal_types::EvaluationResult),
        },
        SchemaSpec {
            filename: "veraseal.trace.v1.json",
            generate: || schema_for!(Vec<veraseal_types::TraceStep>),
        },
        SchemaSpec {
            filename: "veraseal.metadata.v1.json",
            generate: || schema_for!(veraseal_types::EvaluationMetadata),
        },
        SchemaSpec {
            filename: "veraseal.manifest.v1.json",
            generate: || schema_for!(veraseal_types::Manifest),
        },
        SchemaSpec {
            filename: "veraseal.replay-report.v1.json",
            generate: || schema_for!(veraseal_types::ReplayReport),
        },
        SchemaSpec {
            filename: "veraseal.config.v1.json",
            generate: || schema_for!(veraseal_settings::VerasealConfigV1),
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Check that schemas/ matches what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }
        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {name}");
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {name}");
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

/// Every rule in every table, and every reason code, has a complete explanation whose
/// example payloads parse as JSON objects.
fn explain_coverage() -> anyhow::Result<()> {
    let mut errors = Vec::new();

    let identifiers = explain::all_rule_ids()
        .iter()
        .chain(explain::all_codes())
        .copied();
    for identifier in identifiers {
        let Some(exp) = explain::lookup_explanation(identifier) else {
            errors.push(format!("'{identifier}' has no explanation"));
            continue;
        };
        if exp.title.is_empty() || exp.description.is_empty() || exp.remediation.is_empty() {
            errors.push(format!("'{identifier}' has an empty title, description or remediation"));
        }
        for (label, text) in [("before", exp.examples.before), ("after", exp.examples.after)] {
            match serde_json::from_str::<serde_json::Value>(text) {
                Ok(value) if value.is_object() => {}
                _ => errors.push(format!("'{identifier}' {label} example is not a JSON object")),
            }
        }
    }

    for table in [&EVALUATION_POLICY_V1, &LEGACY_MVP_POLICY] {
        for rule in table.rules() {
            if !explain::all_rule_ids().contains(&rule.id) {
                errors.push(format!("{} rule {} is not registered", table.policy_id, rule.id));
            }
            if !explain::all_codes().contains(&rule.code) {
                errors.push(format!("{} code {} is not registered", table.policy_id, rule.code));
            }
        }
    }

    if errors.is_empty() {
        println!("✓ {} rule ids have explanations", explain::all_rule_ids().len());
        println!("✓ {} codes have explanations", explain::all_codes().len());
        println!("\n✓ All explain coverage checks passed!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {error}");
        }
        bail!("Explain coverage validation failed with {} errors", errors.len())
    }
}

fn compile(spec: &str) -> anyhow::Result<jsonschema::Validator> {
    let schema = schema_specs()
        .into_iter()
        .find(|s| s.filename == spec)
        .map(|s| (s.generate)())
        .with_context(|| format!("unknown schema {spec}"))?;
    jsonschema::validator_for(schema.as_value())
        .map_err(|e| anyhow::anyhow!("Failed to compile {spec}: {e}"))
}

/// Record every documented example in a scratch artifact root, then check that the stored
/// files validate against their schemas, replay cleanly and pass the integrity audit.
fn conform() -> anyhow::Result<()> {
    let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
    let config = ResolvedConfig {
        artifact_root: veraseal_test_util::utf8_path(scratch.path()).join("artifacts"),
        ..ResolvedConfig::default()
    };
    let recorder = Recorder::open(config).context("Failed to open scratch artifact root")?;

    let validators = [
        (ArtifactKind::Input, compile("veraseal.request.v1.json")?),
        (ArtifactKind::Output, compile("veraseal.output.v1.json")?),
        (ArtifactKind::Trace, compile("veraseal.trace.v1.json")?),
        (ArtifactKind::Metadata, compile("veraseal.metadata.v1.json")?),
    ];
    let manifest_validator = compile("veraseal.manifest.v1.json")?;

    let mut errors = Vec::new();
    let mut recorded = 0;

    for example in describe_policy(PolicyChoice::Current).examples {
        let name = &example.name;
        let submission = match recorder.submit(&example.request) {
            Ok(submission) => submission,
            // Two examples may share a payload and therefore an evaluation id.
            Err(e) if e.class() == ErrorClass::Conflict => continue,
            Err(e) => {
                errors.push(format!("{name}: submit failed: {e}"));
                continue;
            }
        };
        recorded += 1;
        let id = submission.evaluation_id.as_str();

        if submission.result.decision != example.expected_decision {
            errors.push(format!(
                "{name}: decided {}, documented {}",
                submission.result.decision, example.expected_decision
            ));
        }

        for (kind, validator) in &validators {
            let bytes = recorder.read_artifact(id, *kind)?;
            let value: serde_json::Value = serde_json::from_slice(&bytes)
                .with_context(|| format!("{name}: {} is not JSON", kind.file_name()))?;
            for error in validator.iter_errors(&value) {
                errors.push(format!("{name}: {}: {error}", kind.file_name()));
            }
        }
        let manifest = serde_json::to_value(recorder.manifest(id)?)?;
        for error in manifest_validator.iter_errors(&manifest) {
            errors.push(format!("{name}: manifest: {error}"));
        }

        let replay = recorder.replay(id)?;
        errors.extend(replay.mismatches.iter().map(|m| format!("{name}: replay: {m}")));
        let audit = recorder.verify_integrity(id)?;
        errors.extend(audit.problems.iter().map(|p| format!("{name}: integrity: {p}")));
    }

    if errors.is_empty() {
        println!("✓ {recorded} example evaluations recorded");
        println!("✓ stored artifacts validate against their schemas");
        println!("✓ every record replays and passes the integrity audit");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {error}");
        }
        bail!("Conformance failed with {} errors", errors.len())
    }
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  explain-coverage  Validate all rule IDs and codes have explanations");
    eprintln!("  conform           Record documented examples and audit the stored artifacts");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "explain-coverage" => explain_coverage(),
        "conform" => conform(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
