// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Resolve contributor identities to profiles (uuid, gender, bot, enrollments) and build author_* fields
// role: enrichment/identity
// inputs: Identity tuples; identities JSON file or HTTP endpoint; item date for enrollment selection
// outputs: IdentityService implementations (file, HTTP, null, cached) and AuthorFields
// side_effects: Network calls inside HttpIdentityService (best-effort)
// invariants:
// - Never panic; lookup failures are "no match"
// - No match leaves service-derived author fields null; tuple-derived fields (name, user_name, domain) stay
// - Matching order: email (case-insensitive), then username, then name (case-insensitive)
// - Cached lookups are shared across rayon workers (Mutex)
// errors: Load/parse errors of the identities file surface with path context; lookup errors are swallowed
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::model::{AuthorFields, Identity, IdentityProfile};

pub const UNKNOWN: &str = "Unknown";

// --- Trait seam for the identity service ---
pub trait IdentityService: Send + Sync {
  fn lookup(&self, identity: &Identity) -> Option<IdentityProfile>;
}

/// Where identity profiles come from for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
  File(PathBuf),
  Http(String),
  Unconfigured,
}

/// Resolves nothing; used when identity resolution is on but no source is configured.
struct NullIdentityService;

impl IdentityService for NullIdentityService {
  fn lookup(&self, _identity: &Identity) -> Option<IdentityProfile> {
    None
  }
}

#[derive(Debug, Deserialize)]
struct Individual {
  #[serde(default)]
  identities: Vec<Identity>,
  #[serde(flatten)]
  profile: IdentityProfile,
}

/// Profiles loaded from a JSON array of individuals, each listing its known identities.
pub struct FileIdentityService {
  profiles: Vec<IdentityProfile>,
  by_email: HashMap<String, usize>,
  by_username: HashMap<String, usize>,
  by_name: HashMap<String, usize>,
}

impl FileIdentityService {
  pub fn from_value(v: serde_json::Value) -> Result<Self> {
    let individuals: Vec<Individual> =
      serde_json::from_value(v).context("identities must be an array of individuals with a uuid")?;

    let mut svc = Self {
      profiles: Vec::with_capacity(individuals.len()),
      by_email: HashMap::new(),
      by_username: HashMap::new(),
      by_name: HashMap::new(),
    };

    for (idx, individual) in individuals.into_iter().enumerate() {
      for id in &individual.identities {
        if let Some(email) = id.email.as_deref() {
          svc.by_email.entry(email.to_lowercase()).or_insert(idx);
        }
        if let Some(username) = id.username.as_deref() {
          svc.by_username.entry(username.to_string()).or_insert(idx);
        }
        if let Some(name) = id.name.as_deref() {
          svc.by_name.entry(name.to_lowercase()).or_insert(idx);
        }
      }
      svc.profiles.push(individual.profile);
    }

    Ok(svc)
  }

  pub fn load(path: &Path) -> Result<Self> {
    let buf = std::fs::read(path).with_context(|| format!("reading identities file {}", path.display()))?;
    let v: serde_json::Value =
      serde_json::from_slice(&buf).with_context(|| format!("parsing identities file {}", path.display()))?;

    Self::from_value(v).with_context(|| format!("loading identities file {}", path.display()))
  }

  pub fn len(&self) -> usize {
    self.profiles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.profiles.is_empty()
  }
}

impl IdentityService for FileIdentityService {
  fn lookup(&self, identity: &Identity) -> Option<IdentityProfile> {
    let by_email = identity
      .email
      .as_deref()
      .and_then(|e| self.by_email.get(&e.to_lowercase()));
    let by_username = || identity.username.as_deref().and_then(|u| self.by_username.get(u));
    let by_name = || identity.name.as_deref().and_then(|n| self.by_name.get(&n.to_lowercase()));

    by_email
      .or_else(by_username)
      .or_else(by_name)
      .and_then(|idx| self.profiles.get(*idx))
      .cloned()
  }
}

/// POSTs the identity tuple as JSON; a 2xx JSON body is the profile.
pub struct HttpIdentityService {
  url: String,
  agent: ureq::Agent,
}

impl HttpIdentityService {
  pub fn new(url: impl Into<String>) -> Self {
    let agent = ureq::AgentBuilder::new().timeout(Duration::from_secs(10)).build();
    Self { url: url.into(), agent }
  }
}

impl IdentityService for HttpIdentityService {
  fn lookup(&self, identity: &Identity) -> Option<IdentityProfile> {
    let response = match self
      .agent
      .post(&self.url)
      .set("Accept", "application/json")
      .set("User-Agent", "topicbox-enrich")
      .send_json(identity)
    {
      Ok(resp) => resp,
      Err(err) => {
        tracing::debug!(url = %self.url, error = %err, "identity lookup failed");
        return None;
      }
    };

    match response.into_json::<IdentityProfile>() {
      Ok(profile) => Some(profile),
      Err(err) => {
        tracing::debug!(url = %self.url, error = %err, "identity lookup returned no profile");
        None
      }
    }
  }
}

// --- In-memory caching wrapper ---
// One lookup per distinct identity per run.
pub struct CachedIdentityService {
  inner: Box<dyn IdentityService>,
  cache: Mutex<HashMap<Identity, Option<IdentityProfile>>>,
}

impl CachedIdentityService {
  pub fn new(inner: Box<dyn IdentityService>) -> Self {
    Self {
      inner,
      cache: Mutex::new(HashMap::new()),
    }
  }

  pub fn cached_len(&self) -> usize {
    self.cache.lock().map(|m| m.len()).unwrap_or(0)
  }
}

impl IdentityService for CachedIdentityService {
  fn lookup(&self, identity: &Identity) -> Option<IdentityProfile> {
    if let Some(hit) = self.cache.lock().ok().and_then(|m| m.get(identity).cloned()) {
      return hit;
    }

    let v = self.inner.lookup(identity);

    if let Ok(mut map) = self.cache.lock() {
      map.insert(identity.clone(), v.clone());
    }

    v
  }
}

pub fn build_service(source: &IdentitySource) -> Result<Box<dyn IdentityService>> {
  let inner: Box<dyn IdentityService> = match source {
    IdentitySource::File(path) => {
      let svc = FileIdentityService::load(path)?;
      tracing::info!(path = %path.display(), individuals = svc.len(), "loaded identities");
      Box::new(svc)
    }
    IdentitySource::Http(url) => Box::new(HttpIdentityService::new(url.clone())),
    IdentitySource::Unconfigured => {
      tracing::warn!("identity resolution enabled without an identity source; author fields stay unresolved");
      Box::new(NullIdentityService)
    }
  };

  Ok(Box::new(CachedIdentityService::new(inner)))
}

/// Lowercased domain part of an email address.
pub fn email_domain(email: &str) -> Option<String> {
  let (_, domain) = email.trim().rsplit_once('@')?;
  let domain = domain.trim();

  if domain.is_empty() {
    None
  } else {
    Some(domain.to_lowercase())
  }
}

fn parse_bound(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }

  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

/// Organizations whose enrollment covers `at` (start inclusive, end exclusive, open bounds allowed).
pub fn active_organizations(profile: &IdentityProfile, at: DateTime<Utc>) -> Vec<String> {
  profile
    .enrollments
    .iter()
    .filter(|e| {
      let after_start = e.start.as_deref().and_then(parse_bound).map_or(true, |s| s <= at);
      let before_end = e.end.as_deref().and_then(parse_bound).map_or(true, |end| at < end);
      after_start && before_end
    })
    .map(|e| e.organization.clone())
    .collect()
}

/// Build the author_* section for one identity and its (possibly missing) profile.
pub fn author_fields(identity: &Identity, profile: Option<&IdentityProfile>, at: DateTime<Utc>) -> AuthorFields {
  let tuple_domain = identity.email.as_deref().and_then(email_domain);

  let Some(profile) = profile else {
    return AuthorFields {
      author_name: identity.name.clone(),
      author_user_name: identity.username.clone(),
      author_domain: tuple_domain,
      ..AuthorFields::default()
    };
  };

  let orgs = active_organizations(profile, at);
  let (org_name, multi_org_names) = match orgs.first() {
    Some(first) => (first.clone(), orgs.clone()),
    None => (UNKNOWN.to_string(), vec![UNKNOWN.to_string()]),
  };

  AuthorFields {
    author_uuid: Some(profile.uuid.clone()),
    author_name: identity.name.clone(),
    author_user_name: identity.username.clone(),
    author_domain: profile.domain.clone().or(tuple_domain),
    author_gender: Some(profile.gender.clone().unwrap_or_else(|| UNKNOWN.to_string())),
    author_gender_acc: profile.gender_acc,
    author_org_name: Some(org_name),
    author_bot: Some(profile.bot),
    author_multi_org_names: Some(multi_org_names),
  }
}
