mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_eval, cmd_info, cmd_plan};
use output::OutputFormat;

/// modlink - evaluate module imports across a build graph
#[derive(Parser)]
#[command(name = "modlink")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Evaluate every node of a graph manifest
  Eval {
    /// Path to the graph manifest (JSON)
    graph: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Maximum number of nodes evaluated in parallel
    #[arg(short = 'j', long)]
    parallelism: Option<usize>,
  },

  /// Show evaluation waves and path decisions without running the toolchain
  Plan {
    /// Path to the graph manifest (JSON)
    graph: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show version and default toolchain configuration
  Info,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  // --verbose overrides RUST_LOG
  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Eval {
      graph,
      output,
      parallelism,
    } => cmd_eval(&graph, parallelism, cli.verbose, output),
    Commands::Plan { graph, output } => cmd_plan(&graph, output),
    Commands::Info => cmd_info(),
  }
}
