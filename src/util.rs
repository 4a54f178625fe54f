// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for paths, date parsing/formatting, the "now" override, and man page rendering
// role: utilities/helpers
// inputs: Various primitives; epoch seconds; mail Date headers; clap CommandFactory
// outputs: Canonicalized paths, RFC3339 timestamps, man page text
// invariants:
// - Timestamps are rendered in UTC with a "+00:00" offset, matching the index documents
// - Unparseable dates yield None, never a panic
// errors: None surfaced except man page rendering IO
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};
use clap::CommandFactory;

/// Absolute form of `p` for the run summary; falls back to joining the working directory
/// when the path does not exist (yet).
pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> String {
  let p = p.as_ref();
  let abs: PathBuf = std::fs::canonicalize(p)
    .or_else(|_| std::env::current_dir().map(|cwd| cwd.join(p)))
    .unwrap_or_else(|_| p.to_path_buf());

  abs.display().to_string()
}

/// Formats an instant as RFC3339 in UTC, e.g. `2024-01-01T10:00:00+00:00`.
pub fn iso_utc(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Converts fractional Unix epoch seconds into an RFC3339 UTC string.
pub fn iso_from_epoch(epoch: f64) -> Option<String> {
  if !epoch.is_finite() {
    return None;
  }

  let secs = epoch.floor();
  let nanos = ((epoch - secs) * 1e9).round().min(999_999_999.0) as u32;

  Utc.timestamp_opt(secs as i64, nanos).single().map(iso_utc)
}

/// Parses a mail `Date` header (RFC 2822) or an RFC3339 timestamp.
pub fn parse_mail_date(s: &str) -> Option<DateTime<FixedOffset>> {
  let s = s.trim();

  DateTime::parse_from_rfc2822(s)
    .or_else(|_| DateTime::parse_from_rfc3339(s))
    .ok()
}

/// Parses the hidden `--now-override` value (RFC3339, or naive `YYYY-MM-DDTHH:MM:SS` taken as UTC).
pub fn parse_now(s: Option<&str>) -> Option<DateTime<Utc>> {
  let s = s?.trim();

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }

  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
    .ok()
    .map(|naive| naive.and_utc())
}

/// Returns the effective "now" given an optional override.
///
/// Centralizes our handling of test determinism without sprinkling
/// `Utc::now()` throughout the code.
pub fn effective_now(override_now: Option<DateTime<Utc>>) -> DateTime<Utc> {
  override_now.unwrap_or_else(Utc::now)
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
