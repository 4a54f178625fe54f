// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Serialize enriched and raw documents and write them to stdout or files
// role: output/rendering
// inputs: RichItem slices, raw documents, output location and format
// outputs: Pretty JSON array or JSON lines; files created with parent directories
// side_effects: Writes to stdout or filesystem
// invariants: Document order equals input order; ndjson output has exactly one document per line
// errors: IO errors surfaced with full path context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
  #[default]
  Json,
  Ndjson,
}

pub fn render_docs<T: Serialize>(docs: &[T], format: OutputFormat) -> Result<Vec<u8>> {
  let mut buf = Vec::new();

  match format {
    OutputFormat::Json => {
      serde_json::to_writer_pretty(&mut buf, docs)?;
      buf.push(b'\n');
    }
    OutputFormat::Ndjson => {
      for doc in docs {
        serde_json::to_writer(&mut buf, doc)?;
        buf.push(b'\n');
      }
    }
  }

  Ok(buf)
}

/// Write bytes to `out`, or to stdout when `out` is "-".
pub fn write_output(out: &str, bytes: &[u8]) -> Result<()> {
  if out == "-" {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes).context("writing to stdout")?;
    return stdout.flush().context("flushing stdout");
  }

  let path = Path::new(out);

  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).with_context(|| format!("creating directory {}", parent.display()))?;
  }

  std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

pub fn write_docs<T: Serialize>(out: &str, docs: &[T], format: OutputFormat) -> Result<()> {
  let bytes = render_docs(docs, format)?;
  write_output(out, &bytes)
}
