//! Shared helpers for the `topicbox-enrich` integration tests.
//!
//! Fixtures live in `tests/fixtures`, JSON schemas in `tests/schemas`; both are
//! resolved from this crate's manifest directory so tests behave the same under
//! cargo and nextest.

use std::env;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

/// Binary target exercised by CLI tests.
pub const BIN: &str = "topicbox-enrich";

/// Enrichment instant pinned through `--now-override`.
pub const NOW: &str = "2025-08-15T12:00:00";

/// Install a test-writer tracing subscriber once per process (`RUST_LOG` wins).
pub fn init_tracing() {
  static INIT: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,topicbox_enrich=info"));
    let _ = tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_test_writer()
      .try_init();
  });
  Lazy::force(&INIT);
}

/// Snapshot files (if any) go to `tests/snapshots`; headers omit the expression.
pub fn init_insta() {
  static INIT: Lazy<()> = Lazy::new(|| {
    let mut settings = insta::Settings::clone_current();
    settings.set_snapshot_path("../snapshots");
    settings.set_omit_expression(true);
    // keep the settings bound for the rest of the process
    std::mem::forget(settings.bind_to_scope());
  });
  Lazy::force(&INIT);
}

fn tests_dir() -> PathBuf {
  let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
  manifest.parent().unwrap_or(manifest).to_path_buf()
}

pub fn fixtures_dir() -> PathBuf {
  tests_dir().join("fixtures")
}

pub fn schemas_dir() -> PathBuf {
  tests_dir().join("schemas")
}

pub fn fixture_path<P: AsRef<Path>>(rel_path: P) -> PathBuf {
  fixtures_dir().join(rel_path)
}

pub fn read_fixture_text<P: AsRef<Path>>(rel_path: P) -> String {
  let path = fixture_path(rel_path);
  std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {}: {e}", path.display()))
}

/// Deserialize a JSON fixture (feature `serde`).
#[cfg(feature = "serde")]
pub fn read_fixture_json<T, P>(rel_path: P) -> T
where
  T: serde::de::DeserializeOwned,
  P: AsRef<Path>,
{
  let path = fixture_path(rel_path);
  let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {}: {e}", path.display()));
  serde_json::from_str(&text).unwrap_or_else(|e| panic!("fixture {} is not valid JSON: {e}", path.display()))
}

/// Load a schema from `tests/schemas` (feature `serde`).
#[cfg(feature = "serde")]
pub fn read_schema(name: &str) -> serde_json::Value {
  let path = schemas_dir().join(name);
  let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("schema {}: {e}", path.display()));
  serde_json::from_str(&text).unwrap_or_else(|e| panic!("schema {} is not valid JSON: {e}", path.display()))
}

pub fn tempdir() -> tempfile::TempDir {
  tempfile::tempdir().expect("create tempdir")
}

/// `assert_cmd` handle on a binary target of this workspace.
pub fn cmd_bin(bin: &str) -> assert_cmd::Command {
  init_tracing();
  assert_cmd::Command::cargo_bin(bin).unwrap_or_else(|e| panic!("binary {bin}: {e}"))
}

/// The enrichment binary with `RUST_LOG` cleared and the instant pinned.
pub fn enrich_cmd() -> assert_cmd::Command {
  let mut cmd = cmd_bin(BIN);
  cmd.env_remove("RUST_LOG").args(["--now-override", NOW]);
  cmd
}

/// Set environment variables until the returned guard drops.
pub fn with_env(vars: &[(&str, &str)]) -> EnvGuard {
  let saved = vars
    .iter()
    .map(|(key, value)| {
      let old = env::var(key).ok();
      env::set_var(key, value);
      (key.to_string(), old)
    })
    .collect();
  EnvGuard { saved }
}

/// Restores the variables touched by [`with_env`].
pub struct EnvGuard {
  saved: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
  fn drop(&mut self) {
    for (key, old) in self.saved.drain(..).rev() {
      match old {
        Some(value) => env::set_var(&key, value),
        None => env::remove_var(&key),
      }
    }
  }
}
