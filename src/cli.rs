use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use crate::config::{self, FileConfig};
use crate::enrich::RawFieldsCopy;
use crate::enrichment::identity::IdentitySource;
use crate::render::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "topicbox-enrich",
    version,
    about = "Enrich raw Topicbox mailing-list items into indexable JSON documents",
    long_about = None
)]
pub struct Cli {
  /// Raw items: JSON array or JSON lines (default: stdin "-")
  #[arg(long, default_value = "-")]
  pub input: String,

  /// Enriched output file (default: stdout "-"); with a file, stdout receives the run summary
  #[arg(long, default_value = "-")]
  pub out: String,

  /// Output format for enriched documents
  #[arg(long, value_enum)]
  pub format: Option<OutputFormat>,

  /// Also write the raw documents (JSON lines)
  #[arg(long)]
  pub raw_out: Option<PathBuf>,

  /// Resolve author identities (uuid, organization, gender, bot)
  #[arg(long)]
  pub sortinghat: bool,

  /// Identities JSON file (implies --sortinghat)
  #[arg(long)]
  pub identities: Option<PathBuf>,

  /// Identity lookup endpoint receiving POSTed {email, name, username} (implies --sortinghat)
  #[arg(long)]
  pub identities_url: Option<String>,

  /// Projects JSON file mapping projects to Topicbox origins (and their labels)
  #[arg(long)]
  pub projects: Option<PathBuf>,

  /// Repository labels for origins without labels in the projects file, comma separated
  #[arg(long, value_delimiter = ',')]
  pub repo_labels: Vec<String>,

  /// Raw fields copied verbatim onto rich items, comma separated (origin is always kept)
  #[arg(long, value_delimiter = ',')]
  pub raw_fields_copy: Vec<String>,

  /// Abort on the first item that cannot be enriched instead of skipping it
  #[arg(long)]
  pub fail_fast: bool,

  /// TOML configuration file ([topicbox] table); flags override it
  #[arg(long)]
  pub config: Option<PathBuf>,

  /// Log progress at info level (RUST_LOG wins when set)
  #[arg(long, short)]
  pub verbose: bool,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override the enrichment instant (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Debug)]
pub struct EffectiveConfig {
  pub input: String,
  pub out: String,
  pub format: OutputFormat,
  pub raw_out: Option<String>,
  pub identity: Option<IdentitySource>, // Some when identity resolution is enabled
  pub projects: Option<PathBuf>,
  pub repo_labels: Vec<String>,
  pub raw_fields_copy: RawFieldsCopy,
  pub fail_fast: bool,
  pub verbose: bool,
  pub now_override: Option<String>,
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let file = match &cli.config {
    Some(path) => config::load(path)?,
    None => FileConfig::default(),
  };
  normalize_with(cli, file)
}

pub fn normalize_with(cli: Cli, file: FileConfig) -> Result<EffectiveConfig> {
  let section = file.topicbox;

  let identities = cli.identities.or(section.identities);
  let identities_url = cli.identities_url.or(section.identities_url);

  let source = match (identities, identities_url) {
    (Some(_), Some(_)) => bail!("Ambiguous identity source: choose only one of --identities | --identities-url"),
    (Some(path), None) => Some(IdentitySource::File(path)),
    (None, Some(url)) => Some(IdentitySource::Http(url)),
    (None, None) => None,
  };

  let sortinghat = cli.sortinghat || section.sortinghat.unwrap_or(false) || source.is_some();
  let identity = if sortinghat {
    Some(source.unwrap_or(IdentitySource::Unconfigured))
  } else {
    None
  };

  let repo_labels = if cli.repo_labels.is_empty() {
    section.repo_labels.unwrap_or_default()
  } else {
    cli.repo_labels
  };

  let raw_names = if cli.raw_fields_copy.is_empty() {
    section.raw_fields_copy
  } else {
    Some(cli.raw_fields_copy)
  };

  let raw_fields_copy = match raw_names {
    Some(names) => {
      let reserved: Vec<&str> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| RawFieldsCopy::is_reserved(n))
        .collect();
      if !reserved.is_empty() {
        bail!("--raw-fields-copy names enriched fields: {}", reserved.join(", "));
      }
      RawFieldsCopy::new(names)
    }
    None => RawFieldsCopy::default(),
  };

  Ok(EffectiveConfig {
    input: cli.input,
    out: cli.out,
    format: cli.format.or(section.format).unwrap_or_default(),
    raw_out: cli.raw_out.as_deref().map(|p| p.to_string_lossy().to_string()),
    identity,
    projects: cli.projects.or(section.projects),
    repo_labels,
    raw_fields_copy,
    fail_fast: cli.fail_fast || section.fail_fast.unwrap_or(false),
    verbose: cli.verbose,
    now_override: cli.now_override,
  })
}
