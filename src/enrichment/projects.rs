// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Map a data-source origin to its project and repository labels using a projects file
// role: enrichment/projects
// inputs: projects JSON { "<project>": { "topicbox": ["<origin> --labels=[a, b]", ...] } }
// outputs: ProjectFields (project + project_N levels) and optional label lists per origin
// invariants:
// - Unknown origins fall back to the "Main" project
// - When several projects list one origin, the first seen keeps it
// - Origins compare with trailing slashes removed
// errors: Load/parse errors surface with file path context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::model::ProjectFields;

pub const DEFAULT_PROJECT: &str = "Main";
pub const DATA_SOURCE: &str = "topicbox";

static RE_REPO_ENTRY: Lazy<regex::Regex> =
  Lazy::new(|| regex::Regex::new(r"^\s*(\S+)(?:\s+--labels=\[([^\]]*)\])?\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
struct RepoEntry {
  project: String,
  labels: Option<Vec<String>>,
}

/// Projects declared for the `topicbox` data source, indexed by origin.
#[derive(Debug, Clone, Default)]
pub struct Projects {
  by_origin: BTreeMap<String, RepoEntry>,
}

fn origin_key(origin: &str) -> String {
  origin.trim().trim_end_matches('/').to_string()
}

/// Split `"<origin> --labels=[a, b]"` into the origin and its labels.
pub fn parse_repo_entry(entry: &str) -> Option<(String, Option<Vec<String>>)> {
  let caps = RE_REPO_ENTRY.captures(entry)?;
  let origin = caps.get(1)?.as_str().to_string();
  let labels = caps.get(2).map(|m| {
    m.as_str()
      .split(',')
      .map(str::trim)
      .filter(|l| !l.is_empty())
      .map(str::to_string)
      .collect::<Vec<_>>()
  });

  Some((origin, labels))
}

/// Cumulative dotted prefixes: "A.B" yields project_1 = "A", project_2 = "A.B".
pub fn project_levels(project: &str) -> ProjectFields {
  let mut levels = BTreeMap::new();
  let mut path = String::new();

  for (i, part) in project.split('.').enumerate() {
    if i > 0 {
      path.push('.');
    }
    path.push_str(part);
    levels.insert(format!("project_{}", i + 1), path.clone());
  }

  ProjectFields {
    project: project.to_string(),
    levels,
  }
}

impl Projects {
  pub fn from_value(v: &Value) -> Result<Self> {
    let obj = v.as_object().context("projects file must be a JSON object")?;
    let mut by_origin = BTreeMap::new();

    for (project, sources) in obj {
      let Some(entries) = sources.get(DATA_SOURCE).and_then(Value::as_array) else {
        continue;
      };

      for raw_entry in entries.iter().filter_map(Value::as_str) {
        let Some((origin, labels)) = parse_repo_entry(raw_entry) else {
          tracing::warn!(project = %project, entry = %raw_entry, "ignoring malformed projects entry");
          continue;
        };

        by_origin.entry(origin_key(&origin)).or_insert_with(|| RepoEntry {
          project: project.clone(),
          labels,
        });
      }
    }

    Ok(Self { by_origin })
  }

  pub fn load(path: &Path) -> Result<Self> {
    let buf = std::fs::read(path).with_context(|| format!("reading projects file {}", path.display()))?;
    let v: Value =
      serde_json::from_slice(&buf).with_context(|| format!("parsing projects file {}", path.display()))?;

    Self::from_value(&v).with_context(|| format!("loading projects file {}", path.display()))
  }

  pub fn project_for(&self, origin: Option<&str>) -> ProjectFields {
    let project = origin
      .and_then(|o| self.by_origin.get(&origin_key(o)))
      .map(|e| e.project.as_str())
      .unwrap_or(DEFAULT_PROJECT);

    project_levels(project)
  }

  pub fn labels_for(&self, origin: Option<&str>) -> Option<Vec<String>> {
    origin
      .and_then(|o| self.by_origin.get(&origin_key(o)))
      .and_then(|e| e.labels.clone())
  }

  pub fn len(&self) -> usize {
    self.by_origin.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_origin.is_empty()
  }
}
