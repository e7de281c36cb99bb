//! Implementation of the `oasis generate` command.
//!
//! Reads a batch description, generates every template it declares and
//! reports what happened to each file.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde::Serialize;
use tracing::info;

use oasis_lib::template::{GenerateOptions, Outcome, Registry};

use crate::batch::Batch;
use crate::output::{OutputFormat, describe_outcome, print_error, print_json, print_success, print_warning};

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateArgs {
  pub backup: bool,
  pub backup_slots: Option<u8>,
  pub rollback_on_error: bool,
}

#[derive(Serialize)]
struct Report<'a> {
  path: &'a Path,
  #[serde(skip_serializing_if = "Option::is_none")]
  result: Option<&'a Outcome>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

/// Execute the generate command.
///
/// Every template is attempted even when an earlier one fails. With
/// `rollback_on_error`, a failed run restores the files that were written,
/// which requires backups of every rewritten file.
pub fn cmd_generate(batch_path: &Path, args: GenerateArgs, format: OutputFormat) -> Result<()> {
  let batch = Batch::load(batch_path)?;
  let base = batch_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
  let env = batch.environment();
  let registry = batch.into_registry(&base, &env)?;

  let mut options = GenerateOptions::from_env().with_backup(args.backup || args.rollback_on_error);
  if let Some(slots) = args.backup_slots {
    options = options.with_backup_slots(slots);
  }

  let results = registry.generate_all(&options);
  let failed = results.iter().filter(|(_, r)| r.is_err()).count();

  if format.is_json() {
    let report: Vec<Report> = results
      .iter()
      .map(|(path, result)| Report {
        path,
        result: result.as_ref().ok(),
        error: result.as_ref().err().map(|e| e.to_string()),
      })
      .collect();
    print_json(&report)?;
  } else {
    for (_, result) in &results {
      match result {
        Ok(outcome) => println!("  {}", describe_outcome(outcome)),
        Err(e) => print_error(&e.to_string()),
      }
    }
  }

  if failed == 0 {
    let changed = results
      .iter()
      .filter(|(_, r)| r.as_ref().is_ok_and(Outcome::is_change))
      .count();
    if !format.is_json() {
      print_success(&format!("{} file(s) written, {} unchanged", changed, results.len() - changed));
    }
    return Ok(());
  }

  if args.rollback_on_error {
    let succeeded: Vec<&Outcome> = results.iter().filter_map(|(_, r)| r.as_ref().ok()).collect();
    Registry::rollback_all(succeeded.iter().copied())?;
    info!(count = succeeded.len(), "rolled back generated files");
    if !format.is_json() {
      print_warning(&format!("Rolled back {} file(s)", succeeded.len()));
    }
  }

  bail!("{} of {} file(s) failed", failed, results.len())
}
