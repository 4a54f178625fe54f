// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Decide whether a message opens a thread and which thread key it belongs to
// role: enrichment/threading
// inputs: Raw documents (data.Message-ID, data.In-Reply-To, data.References, data.thread, data.root)
// outputs: ThreadIndex over a batch; Placement { root, thread } per message
// invariants:
// - Source-recorded `root` / `thread` win over computed values
// - Messages sharing an earliest ancestor share a thread key
// - Message-IDs compare after trimming whitespace and angle brackets
// - First-seen document wins when a Message-ID repeats in a batch
// - Cycles resolve to the smallest id on the cycle; the walk always terminates
// - Each indexed entry's thread key is resolved once per batch (linear in the batch size)
// errors: None; malformed references are treated as absent
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::ext::serde_json::JsonFetch;

static RE_BRACKETED_ID: Lazy<regex::Regex> = Lazy::new(|| regex::Regex::new(r"<([^<>\s]+)>").unwrap());

/// Strip surrounding whitespace and angle brackets from a Message-ID.
pub fn normalize_id(raw: &str) -> Option<String> {
  let id = raw.trim().trim_start_matches('<').trim_end_matches('>').trim();

  if id.is_empty() {
    None
  } else {
    Some(id.to_string())
  }
}

/// Ids listed in a header value, in order. Bracketed ids win; bare ids are split on whitespace.
fn ids_in_header(header: &str) -> Vec<String> {
  let bracketed: Vec<String> = RE_BRACKETED_ID
    .captures_iter(header)
    .filter_map(|c| c.get(1))
    .map(|m| m.as_str().to_string())
    .collect();

  if !bracketed.is_empty() {
    return bracketed;
  }

  header.split_whitespace().filter_map(normalize_id).collect()
}

/// The message this one replies to: `In-Reply-To`, else the last `References` entry.
pub fn parent_reference(data: &Value) -> Option<String> {
  if let Some(reply_to) = data.fetch("In-Reply-To").non_empty_str() {
    if let Some(first) = ids_in_header(reply_to).into_iter().next() {
      return Some(first);
    }
  }

  match data.fetch("References").value()? {
    Value::String(s) => ids_in_header(s).pop(),
    Value::Array(refs) => refs
      .iter()
      .filter_map(Value::as_str)
      .flat_map(ids_in_header)
      .last(),
    _ => None,
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
  pub root: bool,
  pub thread: String,
}

#[derive(Debug, Clone, Default)]
struct Entry {
  parent: Option<String>,
  label: Option<String>,
  root: Option<bool>,
}

impl Entry {
  fn from_data(data: &Value) -> Self {
    Self {
      parent: parent_reference(data),
      label: data.fetch("thread").non_empty_str().map(str::to_string),
      root: data.fetch("root").to::<bool>(),
    }
  }
}

/// Reply graph of one batch of raw documents, keyed by normalized Message-ID.
///
/// Every entry's thread key is resolved once when the index is built; placing a
/// message is then a map lookup.
#[derive(Debug, Clone, Default)]
pub struct ThreadIndex {
  entries: HashMap<String, Entry>,
  keys: HashMap<String, String>,
}

/// Thread key an entry hands down to its replies.
fn resolve_key(entries: &HashMap<String, Entry>, keys: &mut HashMap<String, String>, start: &str) {
  let mut path: Vec<&str> = Vec::new();
  let mut on_path: HashSet<&str> = HashSet::new();
  let mut cur = start;

  let key = loop {
    if let Some(known) = keys.get(cur) {
      break known.clone();
    }

    if on_path.contains(cur) {
      let pos = path.iter().position(|seen| *seen == cur).unwrap_or(0);
      break path[pos..].iter().min().copied().unwrap_or(cur).to_string();
    }

    // parent outside the batch
    let Some(entry) = entries.get(cur) else {
      break cur.to_string();
    };

    path.push(cur);
    on_path.insert(cur);

    if let Some(label) = &entry.label {
      break label.clone();
    }

    match (&entry.parent, entry.root) {
      (Some(next), None | Some(false)) => cur = next.as_str(),
      _ => break cur.to_string(),
    }
  };

  for id in path {
    keys.insert(id.to_string(), key.clone());
  }
}

impl ThreadIndex {
  pub fn from_documents<'a, I>(docs: I) -> Self
  where
    I: IntoIterator<Item = &'a Value>,
  {
    let mut entries: HashMap<String, Entry> = HashMap::new();

    for doc in docs {
      let Some(data) = doc.get("data") else { continue };
      let Some(id) = data.fetch("Message-ID").non_empty_str().and_then(normalize_id) else {
        continue;
      };

      entries.entry(id).or_insert_with(|| Entry::from_data(data));
    }

    let mut keys: HashMap<String, String> = HashMap::with_capacity(entries.len());
    for id in entries.keys() {
      resolve_key(&entries, &mut keys, id);
    }

    Self { entries, keys }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Place a message. The indexed entry for its Message-ID wins over `data`, so
  /// repeated ids are placed like the first document seen.
  pub fn place(&self, message_id: &str, data: &Value) -> Placement {
    let own_id = normalize_id(message_id).unwrap_or_else(|| message_id.to_string());

    let unindexed;
    let own = match self.entries.get(&own_id) {
      Some(entry) => entry,
      None => {
        unindexed = Entry::from_data(data);
        &unindexed
      }
    };

    let root = own.root.unwrap_or(own.parent.is_none());

    if let Some(label) = &own.label {
      return Placement { root, thread: label.clone() };
    }

    let thread = match (&own.parent, root) {
      (Some(parent), false) => self.keys.get(parent).cloned().unwrap_or_else(|| parent.clone()),
      _ => own_id,
    };

    Placement { root, thread }
  }
}
