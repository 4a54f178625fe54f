// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate a run: load items, raw stage, batch thread index, parallel enrichment, outputs and summary
// role: processing/orchestrator
// inputs: EffectiveConfig
// outputs: Enriched documents (stdout or --out), optional raw documents (--raw-out), RunSummary
// side_effects: Reads input; writes files; prints documents or the summary to stdout
// invariants:
// - Enriched output order equals raw document order (rayon collect preserves order)
// - items == raw + dropped; raw == enrich + skipped (both reported in RunSummary)
// - --out "-" prints documents; any other --out prints the summary JSON
// errors: Load/write errors propagate with context; MappingError skips the item unless fail_fast
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde_json::Value;

use crate::cli::EffectiveConfig;
use crate::enrich::TopicboxEnrich;
use crate::enrichment::identity::build_service;
use crate::enrichment::projects::Projects;
use crate::enrichment::threads::ThreadIndex;
use crate::errors::MappingError;
use crate::model::{RichItem, RunSummary};
use crate::raw::{items_to_raw, read_items};
use crate::render::{self, OutputFormat};
use crate::util;

pub struct EnrichOutcome {
  pub items: Vec<RichItem>,
  pub skipped: usize,
}

pub fn build_enricher(cfg: &EffectiveConfig, now: DateTime<Utc>) -> Result<TopicboxEnrich> {
  let mut enricher = TopicboxEnrich::new(now)
    .with_raw_fields_copy(cfg.raw_fields_copy.clone())
    .with_repo_labels(cfg.repo_labels.clone());

  if let Some(source) = &cfg.identity {
    enricher = enricher.with_identities(build_service(source)?);
  }

  if let Some(path) = &cfg.projects {
    let projects = Projects::load(path)?;
    tracing::info!(path = %path.display(), origins = projects.len(), "loaded projects");
    enricher = enricher.with_projects(projects);
  }

  Ok(enricher)
}

/// Enrich a batch of raw documents. Thread keys are resolved across the whole batch.
pub fn raw_to_enrich(enricher: &TopicboxEnrich, docs: &[Value], fail_fast: bool) -> Result<EnrichOutcome> {
  let threads = ThreadIndex::from_documents(docs);

  let results: Vec<Result<RichItem, MappingError>> = docs
    .par_iter()
    .map(|doc| enricher.get_rich_item_in(doc, &threads))
    .collect();

  let mut items = Vec::with_capacity(results.len());
  let mut skipped = 0usize;

  for result in results {
    match result {
      Ok(item) => items.push(item),
      Err(err) if fail_fast => return Err(err).context("enrichment aborted (--fail-fast)"),
      Err(err) => {
        tracing::warn!(uuid = %err.uuid(), error = %err, "skipping item");
        skipped += 1;
      }
    }
  }

  Ok(EnrichOutcome { items, skipped })
}

pub fn run(cfg: &EffectiveConfig) -> Result<RunSummary> {
  // Phase 1: load + raw stage
  let now = util::effective_now(util::parse_now(cfg.now_override.as_deref()));
  let items = read_items(&cfg.input)?;
  let item_count = items.len();
  let raw = items_to_raw(items);

  if let Some(raw_out) = &cfg.raw_out {
    render::write_docs(raw_out, &raw.docs, OutputFormat::Ndjson)?;
  }

  // Phase 2: enrich
  let enricher = build_enricher(cfg, now)?;
  let outcome = raw_to_enrich(&enricher, &raw.docs, cfg.fail_fast)?;

  // Phase 3: outputs
  render::write_docs(&cfg.out, &outcome.items, cfg.format)?;

  let summary = RunSummary {
    items: item_count,
    raw: raw.docs.len(),
    dropped: raw.dropped,
    enrich: outcome.items.len(),
    skipped: outcome.skipped,
    out: if cfg.out == "-" { "-".to_string() } else { util::canonicalize_lossy(&cfg.out) },
    raw_out: cfg.raw_out.as_deref().map(util::canonicalize_lossy),
    generated_at: util::iso_utc(now),
  };

  tracing::info!(
    items = summary.items,
    raw = summary.raw,
    dropped = summary.dropped,
    enrich = summary.enrich,
    skipped = summary.skipped,
    "enrichment finished"
  );

  if cfg.out != "-" {
    let mut bytes = serde_json::to_vec_pretty(&summary)?;
    bytes.push(b'\n');
    render::write_output("-", &bytes)?;
  }

  Ok(summary)
}
