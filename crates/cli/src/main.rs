mod batch;
mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use oasis_lib::template::CommentStyle;

use crate::cmd::GenerateArgs;
use crate::output::{OutputFormat, print_error};

/// oasis - Regenerate managed sections of build files
#[derive(Parser)]
#[command(name = "oasis")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate the files declared in a batch description
  Generate {
    /// Path to the batch description (JSON)
    batch: PathBuf,

    /// Back up every file that is rewritten in place
    #[arg(long)]
    backup: bool,

    /// Numbered backup names tried after .bak
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    backup_slots: Option<u8>,

    /// Restore the written files if any template fails
    #[arg(long)]
    rollback_on_error: bool,
  },

  /// Report whether a file's managed section was edited by hand
  Check {
    /// File to inspect
    file: PathBuf,

    /// Comment syntax of the file
    #[arg(short, long, default_value_t = CommentStyle::Shell)]
    comment: CommentStyle,
  },

  /// Evaluate a condition against the host environment
  Eval {
    /// Condition, e.g. "flag(docs) && !os_type(Win32)"
    expr: String,

    /// Set a test variable (key=value)
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    defines: Vec<String>,

    /// Set a flag (name=true|false)
    #[arg(long = "flag", value_name = "NAME=BOOL")]
    flags: Vec<String>,

    /// Start from an empty environment instead of the host variables
    #[arg(long)]
    no_host: bool,
  },
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "info" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Generate {
      batch,
      backup,
      backup_slots,
      rollback_on_error,
    } => cmd::cmd_generate(
      &batch,
      GenerateArgs {
        backup,
        backup_slots,
        rollback_on_error,
      },
      cli.output,
    ),
    Commands::Check { file, comment } => cmd::cmd_check(&file, comment, cli.output),
    Commands::Eval {
      expr,
      defines,
      flags,
      no_host,
    } => cmd::cmd_eval(&expr, &defines, &flags, no_host, cli.output),
  };

  if let Err(e) = result {
    print_error(&format!("{e:#}"));
    std::process::exit(1);
  }
}
