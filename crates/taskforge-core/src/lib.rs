pub mod api;
pub mod cancel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod render;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting taskforge"
  );

  let mut cfg = config::Config::load(
    cli.taskforgerc.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
      .chain(cli.api.map(|url| {
        ("api.url".to_string(), url)
      }))
  );
  debug!(files = ?cfg.loaded_files, "configuration loaded");

  let settings = cfg
    .api_settings()
    .context("invalid API settings")?;
  let api =
    api::HttpTaskApi::new(&settings)
      .with_context(|| {
        format!(
          "failed to set up client for \
           {}{}",
          settings.base_url,
          settings.path
        )
      })?;

  let renderer =
    render::Renderer::new(&cfg)?;
  let command = cli
    .command
    .unwrap_or(cli::Command::Show);

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;

  runtime.block_on(commands::dispatch(
    api, &renderer, command
  ))?;

  info!("done");
  Ok(())
}
