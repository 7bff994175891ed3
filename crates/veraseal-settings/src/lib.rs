//! Config parsing and resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod resolve;

pub use model::{LimitsConfig, VerasealConfigV1};
pub use resolve::{DEFAULT_ARTIFACT_ROOT, Overrides, ResolvedConfig};

/// Parse `veraseal.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<VerasealConfigV1> {
    let cfg: VerasealConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config (defaults + file + overrides), validating every value.
pub fn resolve_config(
    cfg: VerasealConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
