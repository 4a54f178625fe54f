// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Optional TOML configuration file providing defaults for the enrichment run
// role: configuration/file
// inputs: TOML file with a [topicbox] table
// outputs: FileConfig with paths resolved against the config file's directory
// invariants: Unknown keys in [topicbox] are rejected; every key is optional; CLI flags override file values (see cli::normalize)
// errors: IO and TOML errors surface with the file path
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::render::OutputFormat;

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct FileConfig {
  #[serde(default)]
  pub topicbox: TopicboxSection,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TopicboxSection {
  pub sortinghat: Option<bool>,
  pub identities: Option<PathBuf>,
  pub identities_url: Option<String>,
  pub projects: Option<PathBuf>,
  pub repo_labels: Option<Vec<String>>,
  pub raw_fields_copy: Option<Vec<String>>,
  pub format: Option<OutputFormat>,
  pub fail_fast: Option<bool>,
}

fn resolve_relative(base: &Path, p: Option<PathBuf>) -> Option<PathBuf> {
  p.map(|p| if p.is_relative() { base.join(p) } else { p })
}

pub fn parse(text: &str) -> Result<FileConfig> {
  toml::from_str(text).context("parsing TOML configuration")
}

pub fn load(path: &Path) -> Result<FileConfig> {
  let text = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
  let mut cfg = parse(&text).with_context(|| format!("loading config file {}", path.display()))?;

  let base = path.parent().unwrap_or_else(|| Path::new("."));
  cfg.topicbox.identities = resolve_relative(base, cfg.topicbox.identities.take());
  cfg.topicbox.projects = resolve_relative(base, cfg.topicbox.projects.take());

  tracing::info!(path = %path.display(), "loaded configuration file");

  Ok(cfg)
}
