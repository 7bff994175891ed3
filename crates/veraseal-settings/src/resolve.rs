use crate::model::VerasealConfigV1;
use anyhow::Context;
use camino::Utf8PathBuf;
use veraseal_domain::{EnvelopeLimits, PolicyChoice};
use veraseal_types::ids;

pub const DEFAULT_ARTIFACT_ROOT: &str = "artifacts";

const MAX_CONFIGURABLE_LEN: u32 = 4096;

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub artifact_root: Option<String>,
    pub policy: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub artifact_root: Utf8PathBuf,
    pub policy: PolicyChoice,
    pub limits: EnvelopeLimits,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            artifact_root: Utf8PathBuf::from(DEFAULT_ARTIFACT_ROOT),
            policy: PolicyChoice::Current,
            limits: EnvelopeLimits::default(),
        }
    }
}

pub fn resolve_config(
    cfg: VerasealConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref() {
        if schema != ids::SCHEMA_CONFIG_V1 {
            anyhow::bail!(
                "unsupported config schema: {schema} (expected '{}')",
                ids::SCHEMA_CONFIG_V1
            );
        }
    }

    let mut resolved = ResolvedConfig::default();

    if let Some(root) = overrides.artifact_root.or(cfg.artifact_root) {
        if root.trim().is_empty() {
            anyhow::bail!("artifact_root must not be empty");
        }
        resolved.artifact_root = Utf8PathBuf::from(root);
    }

    if let Some(policy) = overrides.policy.or(cfg.policy) {
        resolved.policy = parse_policy(&policy)?;
    }

    if let Some(len) = cfg.limits.max_subject_len {
        resolved.limits.max_subject_len =
            parse_limit(len).context("invalid limits.max_subject_len")?;
    }
    if let Some(len) = cfg.limits.max_ruleset_len {
        resolved.limits.max_ruleset_len =
            parse_limit(len).context("invalid limits.max_ruleset_len")?;
    }

    Ok(resolved)
}

fn parse_policy(v: &str) -> anyhow::Result<PolicyChoice> {
    match PolicyChoice::from_policy_id(v) {
        Some(PolicyChoice::Current) => Ok(PolicyChoice::Current),
        Some(PolicyChoice::Legacy) => anyhow::bail!(
            "policy {v} is only used to replay legacy records and cannot evaluate new submissions"
        ),
        None => anyhow::bail!(
            "unknown policy: {v} (expected '{}')",
            ids::POLICY_EVALUATION_V1
        ),
    }
}

fn parse_limit(v: u32) -> anyhow::Result<usize> {
    if v == 0 || v > MAX_CONFIGURABLE_LEN {
        anyhow::bail!("{v} is out of range (expected 1..={MAX_CONFIGURABLE_LEN})");
    }
    Ok(v as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config_toml;

    #[test]
    fn empty_config_resolves_to_defaults() {
        let cfg = parse_config_toml("").expect("parse");
        let resolved = resolve_config(cfg, Overrides::default()).expect("resolve");
        assert_eq!(resolved, ResolvedConfig::default());
        assert_eq!(resolved.artifact_root, "artifacts");
        assert_eq!(resolved.limits.max_subject_len, 128);
    }

    #[test]
    fn file_values_apply() {
        let cfg = parse_config_toml(
            r#"
schema = "veraseal.config.v1"
artifact_root = "/var/lib/veraseal"
policy = "evaluation-policy-v1"

[limits]
max_subject_len = 64
max_ruleset_len = 256
"#,
        )
        .expect("parse");
        let resolved = resolve_config(cfg, Overrides::default()).expect("resolve");
        assert_eq!(resolved.artifact_root, "/var/lib/veraseal");
        assert_eq!(resolved.policy, PolicyChoice::Current);
        assert_eq!(resolved.limits.max_subject_len, 64);
        assert_eq!(resolved.limits.max_ruleset_len, 256);
    }

    #[test]
    fn overrides_win_over_file() {
        let cfg = parse_config_toml(r#"artifact_root = "from-file""#).expect("parse");
        let resolved = resolve_config(
            cfg,
            Overrides {
                artifact_root: Some("from-override".to_string()),
                policy: None,
            },
        )
        .expect("resolve");
        assert_eq!(resolved.artifact_root, "from-override");
    }

    #[test]
    fn legacy_policy_is_refused_for_new_submissions() {
        let cfg = parse_config_toml(r#"policy = "mvp-placeholder-v0""#).expect("parse");
        let err = resolve_config(cfg, Overrides::default()).expect_err("legacy");
        assert!(err.to_string().contains("legacy"));
    }

    #[test]
    fn unknown_policy_and_schema_are_errors() {
        let cfg = parse_config_toml(r#"policy = "policy-v9""#).expect("parse");
        assert!(resolve_config(cfg, Overrides::default()).is_err());

        let cfg = parse_config_toml(r#"schema = "veraseal.config.v2""#).expect("parse");
        assert!(resolve_config(cfg, Overrides::default()).is_err());
    }

    #[test]
    fn limits_out_of_range_are_errors() {
        for text in [
            "[limits]\nmax_subject_len = 0",
            "[limits]\nmax_ruleset_len = 5000",
        ] {
            let cfg = parse_config_toml(text).expect("parse");
            let err = resolve_config(cfg, Overrides::default()).expect_err(text);
            assert!(err.to_string().starts_with("invalid limits."), "{err}");
        }
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        assert!(parse_config_toml("artifact_dir = \"x\"").is_err());
        assert!(parse_config_toml("[limits]\nmax_len = 3").is_err());
    }

    #[test]
    fn blank_artifact_root_is_an_error() {
        let cfg = parse_config_toml(r#"artifact_root = "  ""#).expect("parse");
        assert!(resolve_config(cfg, Overrides::default()).is_err());
    }
}
