use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use topicbox_enrich::cli::{normalize, Cli};
use topicbox_enrich::{pipeline, util};

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "info" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  // stdout carries documents or the summary; logs go to stderr
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .try_init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  init_tracing(cli.verbose);

  // Phase 1: normalize CLI (+ optional config file)
  let cfg = normalize(cli)?;

  // Phase 2: load, raw stage, enrich, write
  pipeline::run(&cfg)?;

  Ok(())
}
