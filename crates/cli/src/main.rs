mod cmd;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// provision - fetch engine binaries and keep their bindings current
#[derive(Parser)]
#[command(name = "provision")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Args, Clone, Default)]
pub struct CommonArgs {
  /// Path to the config file (default: ./provision.toml if present)
  #[arg(short, long)]
  pub config: Option<PathBuf>,

  /// Output format
  #[arg(short, long, value_enum, default_value_t)]
  pub output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
  /// Rebuild if stale, install missing targets, clean up and regenerate bindings
  Install {
    #[command(flatten)]
    common: CommonArgs,

    /// Acquire targets concurrently
    #[arg(long)]
    concurrent: bool,

    /// Skip the staleness check and rebuild
    #[arg(long)]
    skip_rebuild: bool,

    /// Per-target download limit, e.g. "10m" ("0s" disables it)
    #[arg(long, value_parser = humantime::parse_duration)]
    fetch_timeout: Option<Duration>,
  },

  /// Show installed targets, staleness and cleanup candidates
  Status {
    #[command(flatten)]
    common: CommonArgs,
  },

  /// Remove stale installations and legacy directories
  Clean {
    #[command(flatten)]
    common: CommonArgs,

    /// Show what would be removed without deleting anything
    #[arg(long)]
    dry_run: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn,provision_lib=info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Some(Commands::Install {
      common,
      concurrent,
      skip_rebuild,
      fetch_timeout,
    }) => cmd::cmd_install(
      &common,
      cmd::InstallFlags {
        concurrent,
        skip_rebuild,
        fetch_timeout,
      },
    ),
    Some(Commands::Status { common }) => cmd::cmd_status(&common, cli.verbose),
    Some(Commands::Clean { common, dry_run }) => cmd::cmd_clean(&common, dry_run),
    None => cmd::cmd_install(&CommonArgs::default(), cmd::InstallFlags::default()),
  }
}
