mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stagehand_lib::consts::TARGET_FILE;
use stagehand_lib::script::BUILD_SCRIPT;

use crate::output::OutputFormat;

/// stagehand - run the scripts of declared targets
#[derive(Parser)]
#[command(name = "stagehand")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the target file
  #[arg(short, long, global = true, default_value = TARGET_FILE)]
  file: PathBuf,

  /// Project root; packages are the target file's directory relative to it
  #[arg(long, global = true)]
  root: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// List targets and their scripts
  List {
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Show the commands a script would execute, without running it
  Show {
    /// Target name or qualified name
    target: String,

    /// Script name
    #[arg(default_value = BUILD_SCRIPT)]
    script: String,

    /// Deployment environment of the target
    #[arg(short, long)]
    environment: Option<String>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Run a script of a target
  Run {
    /// Target name or qualified name
    target: String,

    /// Script name
    #[arg(short, long, default_value = BUILD_SCRIPT)]
    script: String,

    /// Deployment environment of the target
    #[arg(short, long)]
    environment: Option<String>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let root = cli.root.as_deref();

  match cli.command {
    Commands::List { format } => cmd::cmd_list(&cli.file, root, format),
    Commands::Show {
      target,
      script,
      environment,
      format,
    } => cmd::cmd_show(&cli.file, root, &target, &script, environment.as_deref(), cli.verbose, format),
    Commands::Run {
      target,
      script,
      environment,
      format,
    } => cmd::cmd_run(&cli.file, root, &target, &script, environment.as_deref(), format),
  }
}
