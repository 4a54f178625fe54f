// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the JSON model (identity tuple, identity profile, rich item, run summary) shared by enrichment and rendering
// role: model/types
// outputs: Serializable structs with stable field names; optional sections flatten into the rich document
// invariants: Rich field names match the enriched index mapping; author/project sections appear only when enabled; repository_labels always serialized
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Contributor identity as recorded on a raw item for one role.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, Hash)]
pub struct Identity {
  pub email: Option<String>,
  pub name: Option<String>,
  pub username: Option<String>,
}

impl Identity {
  pub fn is_empty(&self) -> bool {
    self.email.is_none() && self.name.is_none() && self.username.is_none()
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Enrollment {
  pub organization: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end: Option<String>,
}

/// Answer of the identity service for a matched individual.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
  pub uuid: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub domain: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gender: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gender_acc: Option<i64>,
  #[serde(default)]
  pub bot: bool,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub enrollments: Vec<Enrollment>,
}

/// Author attributes merged into a rich item when identity resolution is enabled.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AuthorFields {
  pub author_uuid: Option<String>,
  pub author_name: Option<String>,
  pub author_user_name: Option<String>,
  pub author_domain: Option<String>,
  pub author_gender: Option<String>,
  pub author_gender_acc: Option<i64>,
  pub author_org_name: Option<String>,
  pub author_bot: Option<bool>,
  pub author_multi_org_names: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProjectFields {
  pub project: String,
  /// `project_1`, `project_2`, ... holding cumulative dotted prefixes.
  #[serde(flatten)]
  pub levels: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RichItem {
  /// Raw top-level fields copied verbatim; null when absent on the raw document.
  #[serde(flatten)]
  pub raw_copy: BTreeMap<String, Value>,
  #[serde(rename = "Subject")]
  pub subject: String,
  #[serde(rename = "Subject_analyzed")]
  pub subject_analyzed: String,
  #[serde(rename = "Message-ID")]
  pub message_id: String,
  #[serde(rename = "Date")]
  pub date: Option<String>,
  pub email_date: Option<String>,
  pub grimoire_creation_date: Option<String>,
  pub root: bool,
  pub thread: String,
  pub is_topicbox_message: u8,
  pub repository_labels: Option<Vec<String>>,
  #[serde(flatten, skip_serializing_if = "Option::is_none")]
  pub project: Option<ProjectFields>,
  #[serde(flatten, skip_serializing_if = "Option::is_none")]
  pub author: Option<AuthorFields>,
  #[serde(rename = "metadata__enriched_on")]
  pub enriched_on: String,
  #[serde(rename = "metadata__gelk_backend_name")]
  pub backend_name: String,
  #[serde(rename = "metadata__gelk_version")]
  pub backend_version: String,
}

impl RichItem {
  pub fn origin(&self) -> Option<&str> {
    self.raw_copy.get("origin").and_then(Value::as_str)
  }
}

/// Counts and location of one enrichment run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RunSummary {
  pub items: usize,
  pub raw: usize,
  /// Items rejected by the raw stage (not objects, or no `data` object).
  pub dropped: usize,
  pub enrich: usize,
  pub skipped: usize,
  pub out: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub raw_out: Option<String>,
  pub generated_at: String,
}
