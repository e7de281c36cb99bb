//! Writing templates to disk.
//!
//! For each template:
//! 1. If the file does not exist, write the template's header, markers, body
//!    and footer ([`Outcome::Created`]).
//! 2. Otherwise split the file. If its recorded digest no longer matches its
//!    body, copy the file to a backup first.
//! 3. Keep the file's own header and footer and swap in the new body. Files
//!    without a managed section are kept whole.
//! 4. Write only when the body text changed or an alternate target was asked
//!    for ([`Outcome::Regenerated`]); otherwise leave the file alone
//!    ([`Outcome::Unchanged`]).
//!
//! Writes truncate and rewrite in place. A crash mid-write leaves a partial
//! file that the next run regenerates.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use super::comment::CommentSyntax;
use super::split::{BodyState, RawFile, Sections};
use super::{Template, TemplateError, annotate};
use crate::consts::{
  BACKUP_NUMBERED_PREFIX, BACKUP_SLOTS_ENV, BACKUP_SUFFIX, DEFAULT_BACKUP_SLOTS, MAX_BACKUP_SLOTS,
};

/// Options controlling regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
  /// Back up every file rewritten in place, not only hand-edited ones, so
  /// the run can be rolled back.
  pub backup: bool,
  /// Numbered backup names tried after `.bak` (`.ba0`, `.ba1`, ...).
  pub backup_slots: u8,
}

impl Default for GenerateOptions {
  fn default() -> Self {
    Self {
      backup: false,
      backup_slots: DEFAULT_BACKUP_SLOTS,
    }
  }
}

impl GenerateOptions {
  /// Defaults, with the slot count taken from `OASIS_BACKUP_SLOTS` if set.
  pub fn from_env() -> Self {
    let mut options = Self::default();
    if let Ok(raw) = std::env::var(BACKUP_SLOTS_ENV) {
      match raw.trim().parse::<u8>() {
        Ok(slots) if slots <= MAX_BACKUP_SLOTS => options.backup_slots = slots,
        _ => warn!(
          var = BACKUP_SLOTS_ENV,
          value = %raw,
          "invalid backup slot count, using {}",
          DEFAULT_BACKUP_SLOTS
        ),
      }
    }
    options
  }

  pub fn with_backup(mut self, backup: bool) -> Self {
    self.backup = backup;
    self
  }

  pub fn with_backup_slots(mut self, slots: u8) -> Self {
    self.backup_slots = slots;
    self
  }

  /// Backup names for `path`, in the order they are tried.
  pub fn backup_candidates(&self, path: &Path) -> Vec<PathBuf> {
    std::iter::once(suffixed(path, BACKUP_SUFFIX))
      .chain((0..self.backup_slots).map(|i| suffixed(path, &format!("{BACKUP_NUMBERED_PREFIX}{i}"))))
      .collect()
  }
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
  let mut name: OsString = path.as_os_str().to_owned();
  name.push(".");
  name.push(suffix);
  PathBuf::from(name)
}

/// A copy of a file taken before it was rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Backup {
  pub original: PathBuf,
  pub copy: PathBuf,
}

/// What [`generate`] did to a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
  Created { path: PathBuf },
  Regenerated { path: PathBuf, backup: Option<Backup> },
  Unchanged { path: PathBuf },
}

impl Outcome {
  /// The file written (or that would have been).
  pub fn path(&self) -> &Path {
    match self {
      Outcome::Created { path } | Outcome::Regenerated { path, .. } | Outcome::Unchanged { path } => path,
    }
  }

  pub fn backup(&self) -> Option<&Backup> {
    match self {
      Outcome::Regenerated { backup, .. } => backup.as_ref(),
      _ => None,
    }
  }

  pub fn is_change(&self) -> bool {
    !matches!(self, Outcome::Unchanged { .. })
  }
}

/// Reconcile a template with the file on disk.
///
/// # Errors
///
/// - `BackupExhausted` if the file was edited by hand and every backup name
///   is taken; nothing is written in that case
/// - `Read`, `Write`, `Backup` on I/O failure
pub fn generate(template: &Template, options: &GenerateOptions) -> Result<Outcome, TemplateError> {
  let span = info_span!("generate", path = %template.path.display());
  let _guard = span.enter();

  let target = template.target_path();

  let exists = template.path.try_exists().map_err(|source| TemplateError::Read {
    path: template.path.clone(),
    source,
  })?;
  if !exists {
    write_file(target, &template.render(), template.perm)?;
    info!(target = %target.display(), "created");
    return Ok(Outcome::Created {
      path: target.to_path_buf(),
    });
  }

  let content = fs::read(&template.path).map_err(|source| TemplateError::Read {
    path: template.path.clone(),
    source,
  })?;
  let existing = RawFile::parse(&content, &template.syntax);

  let mut backup = None;
  if let BodyState::BodyWithDigest(digest, body) = &existing.sections.body
    && !digest.validate(body)
  {
    let saved = backup_file(&template.path, options)?;
    warn!(
      backup = %saved.copy.display(),
      "managed section was edited by hand, original saved to backup"
    );
    backup = Some(saved);
  }

  let in_place = target == template.path.as_path();
  let Some((rewritten, body)) = merge(&existing, template) else {
    if in_place {
      return Ok(Outcome::Unchanged {
        path: target.to_path_buf(),
      });
    }
    write_file(target, &content, template.perm)?;
    info!(target = %target.display(), "copied");
    return Ok(Outcome::Regenerated {
      path: target.to_path_buf(),
      backup,
    });
  };

  if in_place && existing.sections.body.joined() == Some(body) {
    debug!("unchanged");
    return Ok(Outcome::Unchanged {
      path: target.to_path_buf(),
    });
  }

  if options.backup && in_place && backup.is_none() {
    backup = Some(backup_file(&template.path, options)?);
  }

  write_file(target, &rewritten, template.perm)?;
  info!(target = %target.display(), "regenerated");
  Ok(Outcome::Regenerated {
    path: target.to_path_buf(),
    backup,
  })
}

/// Swap the template's body into the file, returning the new content and the
/// body text it carries.
///
/// Without a managed section there is nothing to replace and `None` is
/// returned. Line directives rewrite the header and footer too, so that path
/// re-renders the whole file from its decoded lines.
fn merge(existing: &RawFile, template: &Template) -> Option<(Vec<u8>, String)> {
  if !existing.sections.body.is_present() {
    warn!("no managed section found, keeping the file as it is");
    return None;
  }

  if !template.line_directives {
    let content = existing.rewrite(&template.body, &template.syntax);
    return Some((content, template.body.join("\n")));
  }

  if !existing.is_utf8() {
    warn!("file is not valid UTF-8, undecodable bytes outside the managed section are replaced");
  }
  let merged = annotate(
    Sections {
      header: existing.sections.header.clone(),
      body: BodyState::Body(template.body.clone()),
      footer: existing.sections.footer.clone(),
    },
    &template.path,
    &template.syntax,
  );
  let body = merged.body.joined().unwrap_or_default();
  Some((existing.render(&merged, &template.syntax), body))
}

fn backup_file(path: &Path, options: &GenerateOptions) -> Result<Backup, TemplateError> {
  let candidates = options.backup_candidates(path);
  for candidate in &candidates {
    if candidate.exists() {
      continue;
    }
    fs::copy(path, candidate).map_err(|source| TemplateError::Backup {
      path: path.to_path_buf(),
      backup: candidate.clone(),
      source,
    })?;
    return Ok(Backup {
      original: path.to_path_buf(),
      copy: candidate.clone(),
    });
  }

  Err(TemplateError::BackupExhausted {
    path: path.to_path_buf(),
    first: candidates.first().cloned().unwrap_or_default(),
    last: candidates.last().cloned().unwrap_or_default(),
  })
}

fn write_file(path: &Path, content: impl AsRef<[u8]>, perm: u32) -> Result<(), TemplateError> {
  let created = !path.exists();
  let write_err = |source| TemplateError::Write {
    path: path.to_path_buf(),
    source,
  };
  fs::write(path, content).map_err(write_err)?;
  // Existing files keep whatever mode they have.
  if created {
    set_mode(path, perm).map_err(write_err)?;
  }
  Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, perm: u32) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(perm))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _perm: u32) -> io::Result<()> {
  Ok(())
}

/// Undo a generation.
///
/// Created files are removed; regenerated files are restored from their
/// backup, which is then deleted. A regenerated file without a backup cannot
/// be restored and is left as is.
pub fn rollback(outcome: &Outcome) -> Result<(), TemplateError> {
  match outcome {
    Outcome::Created { path } => {
      fs::remove_file(path).map_err(|source| TemplateError::Remove {
        path: path.clone(),
        source,
      })?;
      info!(path = %path.display(), "removed generated file");
    }
    Outcome::Regenerated { backup: Some(b), .. } => {
      fs::copy(&b.copy, &b.original).map_err(|source| TemplateError::Restore {
        path: b.original.clone(),
        backup: b.copy.clone(),
        source,
      })?;
      fs::remove_file(&b.copy).map_err(|source| TemplateError::Remove {
        path: b.copy.clone(),
        source,
      })?;
      info!(path = %b.original.display(), "restored from backup");
    }
    Outcome::Regenerated { path, backup: None } => {
      warn!(path = %path.display(), "no backup was kept, cannot restore previous content");
    }
    Outcome::Unchanged { .. } => {}
  }
  Ok(())
}

/// State of a file's managed section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Inspection {
  Missing,
  NoSection,
  /// Managed section without a digest line.
  Unstamped,
  /// Body matches its recorded digest.
  Intact,
  /// Body no longer matches its recorded digest.
  Edited,
}

/// Report the state of `path` without modifying it.
pub fn inspect(path: &Path, syntax: &CommentSyntax) -> Result<Inspection, TemplateError> {
  let content = match fs::read(path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Inspection::Missing),
    Err(source) => {
      return Err(TemplateError::Read {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  Ok(match RawFile::parse(&content, syntax).sections.body {
    BodyState::NoBody => Inspection::NoSection,
    BodyState::Body(_) => Inspection::Unstamped,
    BodyState::BodyWithDigest(digest, body) if digest.validate(&body) => Inspection::Intact,
    BodyState::BodyWithDigest(..) => Inspection::Edited,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::template::Digest;
  use serial_test::serial;
  use tempfile::tempdir;
  use tracing_test::traced_test;

  fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  fn shell_template(path: &Path, body: &[&str]) -> Template {
    Template::new(path, CommentSyntax::shell(), strings(body))
      .with_header(strings(&["# header"]))
      .with_footer(strings(&["# footer"]))
  }

  /// Write a stamped file whose body was then changed by hand.
  fn write_edited(path: &Path) -> String {
    let sh = CommentSyntax::shell();
    let content = format!(
      "top\n# OASIS_START\n{}\nedited\n# OASIS_STOP\nbottom\n",
      sh.digest_line(&Digest::stamp(&["original"]))
    );
    fs::write(path, &content).unwrap();
    content
  }

  #[test]
  fn creates_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("_tags");
    let template = shell_template(&path, &["true: debug"]);

    let outcome = generate(&template, &GenerateOptions::default()).unwrap();

    assert_eq!(outcome, Outcome::Created { path: path.clone() });
    let digest = Digest::stamp(&["true: debug"]);
    assert_eq!(
      fs::read_to_string(&path).unwrap(),
      format!("# header\n# OASIS_START\n# DO NOT EDIT (digest: {digest})\ntrue: debug\n# OASIS_STOP\n# footer\n")
    );
  }

  #[cfg(unix)]
  #[test]
  fn created_file_gets_template_mode_and_rewrite_keeps_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("configure");
    let template = shell_template(&path, &["a"]).with_perm(0o755);
    generate(&template, &GenerateOptions::default()).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o755);

    fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
    generate(&shell_template(&path, &["b"]), &GenerateOptions::default()).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);
  }

  #[test]
  fn second_run_is_unchanged_and_byte_identical() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Makefile");
    let template = shell_template(&path, &["all:", "\tocaml setup.ml -build"]);
    let options = GenerateOptions::default();

    generate(&template, &options).unwrap();
    let first = fs::read(&path).unwrap();

    let outcome = generate(&template, &options).unwrap();
    assert_eq!(outcome, Outcome::Unchanged { path: path.clone() });
    assert_eq!(fs::read(&path).unwrap(), first);
  }

  #[test]
  fn regeneration_keeps_existing_header_and_footer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("_tags");
    generate(&shell_template(&path, &["old"]), &GenerateOptions::default()).unwrap();

    // User edits outside the managed section.
    let content = fs::read_to_string(&path).unwrap();
    let content = content.replace("# header\n", "# my header\n<x>: thread\n");
    let content = content.replace("# footer\n", "# my footer\n");
    fs::write(&path, content).unwrap();

    let template = shell_template(&path, &["new 1", "new 2"]);
    let outcome = generate(&template, &GenerateOptions::default()).unwrap();
    assert_eq!(outcome, Outcome::Regenerated { path: path.clone(), backup: None });

    let sections = Sections::split_str(&fs::read_to_string(&path).unwrap(), &CommentSyntax::shell());
    assert_eq!(sections.header, strings(&["# my header", "<x>: thread"]));
    assert_eq!(sections.footer, strings(&["# my footer"]));
    assert_eq!(sections.body.lines().unwrap(), strings(&["new 1", "new 2"]).as_slice());
  }

  #[test]
  #[traced_test]
  fn hand_edited_body_is_backed_up() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("setup.sh");
    let before = write_edited(&path);

    let outcome = generate(&shell_template(&path, &["fresh"]), &GenerateOptions::default()).unwrap();

    let bak = dir.path().join("setup.sh.bak");
    assert_eq!(
      outcome,
      Outcome::Regenerated {
        path: path.clone(),
        backup: Some(Backup {
          original: path.clone(),
          copy: bak.clone()
        }),
      }
    );
    assert_eq!(fs::read_to_string(&bak).unwrap(), before);
    assert!(logs_contain("edited by hand"));

    let after = fs::read_to_string(&path).unwrap();
    assert!(after.starts_with("top\n# OASIS_START\n"));
    assert!(after.ends_with("fresh\n# OASIS_STOP\nbottom\n"));

    let backups = fs::read_dir(dir.path()).unwrap().count() - 1;
    assert_eq!(backups, 1);
  }

  #[test]
  fn backup_falls_back_to_numbered_suffix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("setup.sh");
    write_edited(&path);
    fs::write(dir.path().join("setup.sh.bak"), "older").unwrap();

    let outcome = generate(&shell_template(&path, &["fresh"]), &GenerateOptions::default()).unwrap();

    assert_eq!(outcome.backup().unwrap().copy, dir.path().join("setup.sh.ba0"));
    assert_eq!(fs::read_to_string(dir.path().join("setup.sh.bak")).unwrap(), "older");
  }

  #[test]
  fn exhausted_backup_names_fail_without_writing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("setup.sh");
    let before = write_edited(&path);
    let options = GenerateOptions::default();
    for candidate in options.backup_candidates(&path) {
      fs::write(candidate, "taken").unwrap();
    }
    let entries_before = fs::read_dir(dir.path()).unwrap().count();

    let err = generate(&shell_template(&path, &["fresh"]), &options).unwrap_err();

    assert!(matches!(err, TemplateError::BackupExhausted { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), entries_before);
  }

  #[test]
  fn backup_candidates_follow_fixed_sequence() {
    let names: Vec<String> = GenerateOptions::default()
      .backup_candidates(Path::new("dir/setup.ml"))
      .into_iter()
      .map(|p| p.to_string_lossy().into_owned())
      .collect();
    assert_eq!(names.len(), 11);
    assert_eq!(names[0], "dir/setup.ml.bak");
    assert_eq!(names[1], "dir/setup.ml.ba0");
    assert_eq!(names[10], "dir/setup.ml.ba9");

    let none = GenerateOptions::default().with_backup_slots(0);
    assert_eq!(none.backup_candidates(Path::new("x")), vec![PathBuf::from("x.bak")]);
  }

  #[test]
  #[traced_test]
  fn file_without_section_is_kept_whole() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("INSTALL.txt");
    fs::write(&path, "hand written\nonly\n").unwrap();

    let outcome = generate(&shell_template(&path, &["generated"]), &GenerateOptions::default()).unwrap();

    assert_eq!(outcome, Outcome::Unchanged { path: path.clone() });
    assert_eq!(fs::read_to_string(&path).unwrap(), "hand written\nonly\n");
    assert!(logs_contain("no managed section"));
  }

  #[test]
  #[traced_test]
  fn missing_stop_marker_is_recovered() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("_tags");
    fs::write(&path, "keep\n# OASIS_START\nstale 1\nstale 2\n").unwrap();

    generate(&shell_template(&path, &["fresh"]), &GenerateOptions::default()).unwrap();

    let sections = Sections::split_str(&fs::read_to_string(&path).unwrap(), &CommentSyntax::shell());
    assert_eq!(sections.header, strings(&["keep"]));
    assert_eq!(sections.body.lines().unwrap(), strings(&["fresh"]).as_slice());
    assert!(sections.footer.is_empty());
    assert!(logs_contain("no stop marker"));
  }

  #[test]
  fn alternate_target_always_written_and_source_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("_oasis_tags");
    let preview = dir.path().join("preview");
    let template = shell_template(&path, &["same"]);
    generate(&template, &GenerateOptions::default()).unwrap();
    let source = fs::read_to_string(&path).unwrap();

    let outcome = generate(&template.clone().with_target(&preview), &GenerateOptions::default()).unwrap();

    assert_eq!(outcome, Outcome::Regenerated { path: preview.clone(), backup: None });
    assert_eq!(fs::read_to_string(&preview).unwrap(), source);
    assert_eq!(fs::read_to_string(&path).unwrap(), source);
  }

  #[test]
  fn backup_option_allows_rollback() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("_tags");
    generate(&shell_template(&path, &["v1"]), &GenerateOptions::default()).unwrap();
    let v1 = fs::read_to_string(&path).unwrap();

    let options = GenerateOptions::default().with_backup(true);
    let outcome = generate(&shell_template(&path, &["v2"]), &options).unwrap();
    let backup = outcome.backup().cloned().unwrap();
    assert_eq!(fs::read_to_string(&backup.copy).unwrap(), v1);

    rollback(&outcome).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), v1);
    assert!(!backup.copy.exists());
  }

  #[test]
  fn rollback_removes_created_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("new");
    let outcome = generate(&shell_template(&path, &["x"]), &GenerateOptions::default()).unwrap();
    rollback(&outcome).unwrap();
    assert!(!path.exists());

    rollback(&Outcome::Unchanged { path: path.clone() }).unwrap();
  }

  #[test]
  fn line_directives_survive_regeneration() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("setup.ml");
    let template = Template::new(&path, CommentSyntax::ml(), strings(&["# 1 \"src/gone.ml\"", "let x = 1"]))
      .with_header(strings(&["(* setup *)"]))
      .with_line_directives();
    let options = GenerateOptions::default();

    assert!(matches!(generate(&template, &options).unwrap(), Outcome::Created { .. }));
    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "# 2 \"setup.ml\"");
    assert_eq!(lines[4], "# 6 \"setup.ml\"");
    assert_eq!(lines[5], "(* # 1 \"src/gone.ml\" *)");
    assert_eq!(lines[8], "# 10 \"setup.ml\"");
    assert_eq!(lines.len(), 9);

    assert_eq!(
      generate(&template, &options).unwrap(),
      Outcome::Unchanged { path: path.clone() }
    );
  }

  #[test]
  fn non_utf8_header_and_footer_are_kept_byte_for_byte() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("_tags");
    fs::write(&path, b"# caf\xe9 latin-1 header\n# OASIS_START\nold\n# OASIS_STOP\nt\xe2il\n").unwrap();

    let outcome = generate(&shell_template(&path, &["new"]), &GenerateOptions::default()).unwrap();

    assert_eq!(outcome, Outcome::Regenerated { path: path.clone(), backup: None });
    let digest = Digest::stamp(&["new"]).to_hex();
    let expected = [
      &b"# caf\xe9 latin-1 header\n# OASIS_START\n"[..],
      format!("# DO NOT EDIT (digest: {digest})\n").as_bytes(),
      &b"new\n# OASIS_STOP\nt\xe2il\n"[..],
    ]
    .concat();
    assert_eq!(fs::read(&path).unwrap(), expected);
    assert_eq!(inspect(&path, &CommentSyntax::shell()).unwrap(), Inspection::Intact);
  }

  #[test]
  fn crlf_file_keeps_its_line_endings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("configure.bat");
    fs::write(&path, "@echo off\r\nrem OASIS_START\r\nold\r\nrem OASIS_STOP\r\nexit\r\n").unwrap();
    let template = Template::new(&path, CommentSyntax::bat(), strings(&["ocaml setup.ml %*"]));

    generate(&template, &GenerateOptions::default()).unwrap();

    let digest = Digest::stamp(&["ocaml setup.ml %*"]).to_hex();
    assert_eq!(
      fs::read_to_string(&path).unwrap(),
      format!(
        "@echo off\r\nrem OASIS_START\r\nrem DO NOT EDIT (digest: {digest})\r\nocaml setup.ml %*\r\nrem OASIS_STOP\r\nexit\r\n"
      )
    );
    assert_eq!(
      generate(&template, &GenerateOptions::default()).unwrap(),
      Outcome::Unchanged { path: path.clone() }
    );
  }

  #[test]
  fn missing_final_newline_is_preserved() {
    let dir = tempdir().unwrap();
    let footer_path = dir.path().join("with_footer");
    fs::write(&footer_path, "# OASIS_START\nold\n# OASIS_STOP\nlast line").unwrap();
    generate(&shell_template(&footer_path, &["new"]), &GenerateOptions::default()).unwrap();
    let content = fs::read_to_string(&footer_path).unwrap();
    assert!(content.ends_with("new\n# OASIS_STOP\nlast line"), "{content:?}");

    let stop_path = dir.path().join("ends_at_stop");
    fs::write(&stop_path, "# OASIS_START\nold\n# OASIS_STOP").unwrap();
    generate(&shell_template(&stop_path, &["new"]), &GenerateOptions::default()).unwrap();
    let content = fs::read_to_string(&stop_path).unwrap();
    assert!(content.ends_with("new\n# OASIS_STOP"), "{content:?}");
  }

  #[test]
  fn line_directives_keep_crlf_endings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("setup.ml");
    let template = Template::new(&path, CommentSyntax::ml(), strings(&["let x = 1"])).with_line_directives();
    fs::write(&path, "(* top *)\r\n(* OASIS_START *)\r\nold\r\n(* OASIS_STOP *)\r\n").unwrap();
    let options = GenerateOptions::default();

    generate(&template, &options).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# 2 \"setup.ml\"\r\n(* top *)\r\n(* OASIS_START *)\r\n"));
    assert_eq!(content.matches("\r\n").count(), content.matches('\n').count());

    assert_eq!(generate(&template, &options).unwrap(), Outcome::Unchanged { path: path.clone() });
  }

  #[test]
  fn inspect_reports_section_state() {
    let dir = tempdir().unwrap();
    let sh = CommentSyntax::shell();
    let path = dir.path().join("f");
    assert_eq!(inspect(&path, &sh).unwrap(), Inspection::Missing);

    fs::write(&path, "plain\n").unwrap();
    assert_eq!(inspect(&path, &sh).unwrap(), Inspection::NoSection);

    fs::write(&path, "# OASIS_START\nx\n# OASIS_STOP\n").unwrap();
    assert_eq!(inspect(&path, &sh).unwrap(), Inspection::Unstamped);

    fs::remove_file(&path).unwrap();
    generate(&shell_template(&path, &["x"]), &GenerateOptions::default()).unwrap();
    assert_eq!(inspect(&path, &sh).unwrap(), Inspection::Intact);

    write_edited(&path);
    assert_eq!(inspect(&path, &sh).unwrap(), Inspection::Edited);
  }

  #[test]
  #[serial]
  fn backup_slots_read_from_environment() {
    temp_env::with_var(BACKUP_SLOTS_ENV, Some("3"), || {
      assert_eq!(GenerateOptions::from_env().backup_slots, 3);
    });
    temp_env::with_var(BACKUP_SLOTS_ENV, Some("many"), || {
      assert_eq!(GenerateOptions::from_env().backup_slots, DEFAULT_BACKUP_SLOTS);
    });
    temp_env::with_var(BACKUP_SLOTS_ENV, None::<&str>, || {
      assert_eq!(GenerateOptions::from_env(), GenerateOptions::default());
    });
  }
}
