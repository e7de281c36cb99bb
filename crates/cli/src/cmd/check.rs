//! Implementation of the `oasis check` command.

use std::path::Path;

use anyhow::{Result, bail};

use oasis_lib::template::{CommentStyle, Inspection, inspect};

use crate::output::{OutputFormat, describe_inspection, print_info, print_json, print_success, print_warning};

/// Report the managed-section state of a file.
///
/// Fails when the section was edited by hand, so it can guard a CI step.
pub fn cmd_check(file: &Path, style: CommentStyle, format: OutputFormat) -> Result<()> {
  let inspection = inspect(file, &style.syntax())?;

  if format.is_json() {
    print_json(&serde_json::json!({ "path": file, "state": inspection }))?;
  } else {
    let message = format!("{}: {}", file.display(), describe_inspection(inspection));
    match inspection {
      Inspection::Intact => print_success(&message),
      Inspection::Edited => print_warning(&message),
      _ => print_info(&message),
    }
  }

  if inspection == Inspection::Edited {
    bail!("{} was modified since it was generated", file.display());
  }
  Ok(())
}
