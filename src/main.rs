mod app;
mod cache;
mod commands;
mod config;
mod event;
mod form;
mod logging;
mod notify;
mod query;
mod readflow;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "readflow-tui")]
#[command(about = "A terminal UI for readflow")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/readflow-tui/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// View to open on startup
  #[arg(short, long, value_enum)]
  view: Option<config::StartView>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = config::Config::load(args.config.as_deref())?;

  let config = if let Some(view) = args.view {
    config::Config {
      default_view: view,
      ..config
    }
  } else {
    config
  };

  let _log_guard = logging::init(&config.log)?;
  tracing::info!(endpoint = %config.api.url, "starting readflow-tui");

  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
