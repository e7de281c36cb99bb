//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output: colored status
//! messages, one line per generated file, and JSON output.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use oasis_lib::template::{Inspection, Outcome};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const ADD: &str = "+";
  pub const MODIFY: &str = "~";
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// One-line description of a generation outcome.
pub fn describe_outcome(outcome: &Outcome) -> String {
  match outcome {
    Outcome::Created { path } => format!("{} created {}", symbols::ADD, path.display()),
    Outcome::Regenerated { path, backup: Some(b) } => format!(
      "{} regenerated {} (backup {} {})",
      symbols::MODIFY,
      path.display(),
      symbols::ARROW,
      b.copy.display()
    ),
    Outcome::Regenerated { path, backup: None } => format!("{} regenerated {}", symbols::MODIFY, path.display()),
    Outcome::Unchanged { path } => format!("{} unchanged {}", symbols::INFO, path.display()),
  }
}

pub fn describe_inspection(inspection: Inspection) -> &'static str {
  match inspection {
    Inspection::Missing => "file does not exist",
    Inspection::NoSection => "no managed section",
    Inspection::Unstamped => "managed section without digest",
    Inspection::Intact => "managed section intact",
    Inspection::Edited => "managed section edited by hand",
  }
}
