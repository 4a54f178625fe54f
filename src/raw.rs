// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Load collected Topicbox items and turn them into raw index documents
// role: ingestion/raw stage
// inputs: JSON array, JSON lines, or concatenated JSON values (file or stdin)
// outputs: RawStage { docs, dropped } with metadata__updated_on / metadata__timestamp added
// side_effects: Reads the input file or stdin
// invariants:
// - One raw document per well-formed item, in input order
// - Items that are not objects or lack a `data` object are dropped and counted
// - Existing metadata__* fields are kept as they are
// errors: IO and JSON syntax errors surface with the input location
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Read;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::ext::serde_json::JsonFetch;
use crate::util::iso_from_epoch;

pub struct RawStage {
  pub docs: Vec<Value>,
  pub dropped: usize,
}

/// Parse every JSON value in `text`; a top-level array contributes its elements.
pub fn parse_items(text: &str) -> Result<Vec<Value>> {
  let mut items = Vec::new();

  for (n, parsed) in serde_json::Deserializer::from_str(text).into_iter::<Value>().enumerate() {
    match parsed.with_context(|| format!("parsing input value #{}", n + 1))? {
      Value::Array(arr) => items.extend(arr),
      other => items.push(other),
    }
  }

  Ok(items)
}

/// Read items from a path, or from stdin when `input` is "-".
pub fn read_items(input: &str) -> Result<Vec<Value>> {
  let text = if input == "-" {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf).context("reading items from stdin")?;
    buf
  } else {
    std::fs::read_to_string(input).with_context(|| format!("reading items from {}", input))?
  };

  parse_items(&text).with_context(|| format!("loading items from {}", input))
}

fn to_raw_document(item: Value) -> Option<Value> {
  let Value::Object(mut obj) = item else { return None };

  if !obj.get("data").is_some_and(Value::is_object) {
    return None;
  }

  for (source, target) in [("updated_on", "metadata__updated_on"), ("timestamp", "metadata__timestamp")] {
    if obj.contains_key(target) {
      continue;
    }
    if let Some(iso) = obj.get(source).and_then(Value::as_f64).and_then(iso_from_epoch) {
      obj.insert(target.to_string(), Value::String(iso));
    }
  }

  Some(Value::Object(obj))
}

/// Raw stage: keep well-formed items and stamp the date metadata an indexer adds.
pub fn items_to_raw(items: Vec<Value>) -> RawStage {
  let total = items.len();
  let mut docs = Vec::with_capacity(total);

  for (pos, item) in items.into_iter().enumerate() {
    let uuid = item.fetch("uuid").to::<String>();

    match to_raw_document(item) {
      Some(doc) => docs.push(doc),
      None => tracing::warn!(position = pos, uuid = ?uuid, "dropping item without a data object"),
    }
  }

  let dropped = total - docs.len();

  RawStage { docs, dropped }
}
