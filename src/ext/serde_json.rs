// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Dotted-path lookups into raw items (e.g. "data.author.email") with typed or nullable extraction
// role: extension/serde_json
// outputs: JsonFetch trait and JsonFetched wrapper (to, to_or_default, non_empty_str, or_null, is_present)
// invariants: No panics; missing paths yield None; explicit JSON null counts as present but deserializes to None for Option
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;
use serde_json::Value;

/// A JSON location resolved by [`JsonFetch::fetch`]; extraction is a second step.
pub struct JsonFetched<'a> {
  inner: Option<&'a Value>,
}

impl<'a> JsonFetched<'a> {
  /// Attempt to deserialize the fetched value as `T`. JSON null yields `None`.
  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self
      .inner
      .filter(|v| !v.is_null())
      .and_then(|v| T::deserialize(v).ok())
  }

  /// Deserialize as `T`, returning `T::default()` on failure.
  pub fn to_or_default<T>(&self) -> T
  where
    T: DeserializeOwned + Default,
  {
    self.to::<T>().unwrap_or_default()
  }

  /// Borrow the value as a string slice when it is a string with non-whitespace content.
  pub fn non_empty_str(&self) -> Option<&'a str> {
    self.inner.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
  }

  /// Clone the value, or produce JSON null when the path did not resolve.
  pub fn or_null(&self) -> Value {
    self.inner.cloned().unwrap_or(Value::Null)
  }

  /// True when the path resolved, even to an explicit null.
  pub fn is_present(&self) -> bool {
    self.inner.is_some()
  }

  pub fn value(&self) -> Option<&'a Value> {
    self.inner
  }
}

/// Fetch nested values via dotted paths like "data.author.email".
///
/// Path segments are object keys; keys containing a dash (`Message-ID`) are fine,
/// keys containing a dot are not addressable.
pub trait JsonFetch {
  fn fetch(&self, path: &str) -> JsonFetched<'_>;
}

impl JsonFetch for Value {
  fn fetch(&self, path: &str) -> JsonFetched<'_> {
    if path.is_empty() {
      return JsonFetched { inner: Some(self) };
    }

    let mut cur = self;

    for key in path.split('.') {
      match cur.get(key) {
        Some(next) => cur = next,
        None => return JsonFetched { inner: None },
      }
    }

    JsonFetched { inner: Some(cur) }
  }
}
