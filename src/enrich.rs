// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Map one raw Topicbox document to its rich document (copied fields, thread placement, labels, projects, author identity)
// role: enrichment/mapper
// inputs: Raw documents; ThreadIndex of the batch; optional identity service, projects, repository labels
// outputs: RichItem; identity tuples via get_sh_identity
// invariants:
// - Every RAW_FIELDS_COPY name is present on the rich item (value or null)
// - repository_labels is present on every rich item
// - author_* fields appear only when identity resolution is enabled
// - Same raw document and same "now" always give the same rich item
// errors: MappingError when data / data.Subject / data.Message-ID are missing; identity failures degrade to null fields
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::enrichment::identity::{author_fields, IdentityService};
use crate::enrichment::projects::Projects;
use crate::enrichment::threads::ThreadIndex;
use crate::errors::MappingError;
use crate::ext::serde_json::JsonFetch;
use crate::model::{Identity, RichItem};
use crate::util::{iso_utc, parse_mail_date};

pub const BACKEND_NAME: &str = "TopicboxEnrich";
pub const REPO_LABELS: &str = "repository_labels";
pub const AUTHOR_ROLE: &str = "author";

/// Raw fields copied verbatim onto every rich item.
pub const RAW_FIELDS_COPY: [&str; 6] = [
  "metadata__updated_on",
  "metadata__timestamp",
  "offset",
  "origin",
  "tag",
  "uuid",
];

/// Keys the mapper itself writes on a rich item; raw copies must not reuse them.
const RICH_FIELDS: [&str; 14] = [
  "Subject",
  "Subject_analyzed",
  "Message-ID",
  "Date",
  "email_date",
  "grimoire_creation_date",
  "root",
  "thread",
  "is_topicbox_message",
  REPO_LABELS,
  "project",
  "metadata__enriched_on",
  "metadata__gelk_backend_name",
  "metadata__gelk_version",
];

/// Set of raw top-level field names copied unchanged; `origin` is always part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFieldsCopy(BTreeSet<String>);

impl RawFieldsCopy {
  /// True when `name` is a rich item key (including `project_N` and `author_*`).
  pub fn is_reserved(name: &str) -> bool {
    RICH_FIELDS.contains(&name) || name.starts_with("project_") || name.starts_with("author_")
  }

  /// Build the set from `names`; blank and reserved names are left out.
  pub fn new<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut set = BTreeSet::new();

    for name in names {
      let name: String = name.into();
      let name = name.trim();
      if name.is_empty() {
        continue;
      }
      if Self::is_reserved(name) {
        tracing::warn!(field = %name, "not copying raw field over an enriched field");
        continue;
      }
      set.insert(name.to_string());
    }

    set.insert("origin".to_string());
    Self(set)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains(name)
  }

  fn copy_from(&self, doc: &Value) -> BTreeMap<String, Value> {
    self
      .0
      .iter()
      .map(|name| (name.clone(), doc.get(name).cloned().unwrap_or(Value::Null)))
      .collect()
  }
}

impl Default for RawFieldsCopy {
  fn default() -> Self {
    Self::new(RAW_FIELDS_COPY)
  }
}

/// Enricher for Topicbox raw documents.
pub struct TopicboxEnrich {
  raw_fields_copy: RawFieldsCopy,
  identities: Option<Box<dyn IdentityService>>,
  projects: Option<Projects>,
  repo_labels: Option<Vec<String>>,
  now: DateTime<Utc>,
}

impl Default for TopicboxEnrich {
  fn default() -> Self {
    Self::new(Utc::now())
  }
}

impl TopicboxEnrich {
  pub fn new(now: DateTime<Utc>) -> Self {
    Self {
      raw_fields_copy: RawFieldsCopy::default(),
      identities: None,
      projects: None,
      repo_labels: None,
      now,
    }
  }

  /// Enable identity resolution through `service`.
  pub fn with_identities(mut self, service: Box<dyn IdentityService>) -> Self {
    self.identities = Some(service);
    self
  }

  pub fn with_projects(mut self, projects: Projects) -> Self {
    self.projects = Some(projects);
    self
  }

  /// Labels used when the projects file declares none for an origin.
  pub fn with_repo_labels(mut self, labels: Vec<String>) -> Self {
    self.repo_labels = if labels.is_empty() { None } else { Some(labels) };
    self
  }

  pub fn with_raw_fields_copy(mut self, fields: RawFieldsCopy) -> Self {
    self.raw_fields_copy = fields;
    self
  }

  /// This backend always carries contributor identities (role `author`).
  pub fn has_identities(&self) -> bool {
    true
  }

  pub fn identities_enabled(&self) -> bool {
    self.identities.is_some()
  }

  pub fn raw_fields_copy(&self) -> &RawFieldsCopy {
    &self.raw_fields_copy
  }

  /// Identity tuple recorded for `role`; all fields null when the role value is absent or null.
  ///
  /// `item` may be a raw document (the role is read from `data`) or the role value itself.
  pub fn get_sh_identity(&self, item: &Value, role: &str) -> Identity {
    let value = match item.get("data") {
      Some(data) => data.fetch(role),
      None => item.fetch(""),
    };

    let Some(obj) = value.value().filter(|v| v.is_object()) else {
      return Identity::default();
    };

    Identity {
      email: obj.fetch("email").to::<String>(),
      name: obj.fetch("name").to::<String>(),
      username: obj.fetch("username").to::<String>(),
    }
  }

  /// Rich item for a document enriched on its own; replies point at their direct parent.
  pub fn get_rich_item(&self, item: &Value) -> Result<RichItem, MappingError> {
    let index = ThreadIndex::from_documents([item]);
    self.get_rich_item_in(item, &index)
  }

  /// Rich item for a document that belongs to the batch described by `threads`.
  pub fn get_rich_item_in(&self, item: &Value, threads: &ThreadIndex) -> Result<RichItem, MappingError> {
    let uuid = item.fetch("uuid").to::<String>().unwrap_or_else(|| "<no uuid>".to_string());

    let data = match item.get("data") {
      Some(d) if d.is_object() => d,
      _ => return Err(MappingError::MissingData { uuid }),
    };

    let Some(subject) = data.fetch("Subject").to::<String>() else {
      return Err(MappingError::MissingField { field: "Subject", uuid });
    };
    let Some(message_id) = data.fetch("Message-ID").to::<String>() else {
      return Err(MappingError::MissingField { field: "Message-ID", uuid });
    };

    let raw_copy = self.raw_fields_copy.copy_from(item);
    let origin = item.fetch("origin").to::<String>();

    let date = data.fetch("Date").to::<String>();
    let parsed_date = date.as_deref().and_then(parse_mail_date).map(|d| d.with_timezone(&Utc));
    let email_date = parsed_date.map(iso_utc);
    let grimoire_creation_date = email_date
      .clone()
      .or_else(|| item.fetch("metadata__updated_on").to::<String>());

    let placement = threads.place(&message_id, data);

    let repository_labels = self
      .projects
      .as_ref()
      .and_then(|p| p.labels_for(origin.as_deref()))
      .or_else(|| self.repo_labels.clone());

    let project = self.projects.as_ref().map(|p| p.project_for(origin.as_deref()));

    let author = self.identities.as_deref().map(|service| {
      let identity = self.get_sh_identity(item, AUTHOR_ROLE);
      let profile = if identity.is_empty() { None } else { service.lookup(&identity) };
      if profile.is_none() && !identity.is_empty() {
        tracing::debug!(uuid = %uuid, "no identity match for author");
      }
      author_fields(&identity, profile.as_ref(), parsed_date.unwrap_or(self.now))
    });

    Ok(RichItem {
      raw_copy,
      subject_analyzed: subject.clone(),
      subject,
      message_id,
      date,
      email_date,
      grimoire_creation_date,
      root: placement.root,
      thread: placement.thread,
      is_topicbox_message: 1,
      repository_labels,
      project,
      author,
      enriched_on: iso_utc(self.now),
      backend_name: BACKEND_NAME.to_string(),
      backend_version: env!("CARGO_PKG_VERSION").to_string(),
    })
  }
}
