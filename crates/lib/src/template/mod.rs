//! Managed file templates.
//!
//! A template is the generated content for one file: a header and footer used
//! when the file is first created, and the body that is (re)written between
//! the `OASIS_START` and `OASIS_STOP` markers:
//!
//! ```text
//! <header lines>
//! # OASIS_START
//! # DO NOT EDIT (digest: <hex>)
//! <body lines>
//! # OASIS_STOP
//! <footer lines>
//! ```
//!
//! Regenerating an existing file only replaces the body; anything the user
//! wrote above or below the markers is kept. See [`generate`] for the full
//! decision procedure.

mod comment;
mod digest;
mod generate;
mod origin;
mod registry;
mod split;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use comment::{CommentStyle, CommentSyntax};
pub use digest::Digest;
pub use generate::{Backup, GenerateOptions, Inspection, Outcome, generate, inspect, rollback};
pub use origin::{LineDirective, annotate, neutralize, physical_lines};
pub use registry::Registry;
pub use split::{BodyState, RawFile, Sections};

use crate::consts::DEFAULT_PERM;

/// Errors raised while registering, generating or rolling back templates.
///
/// Each error concerns a single file; other templates can still be generated.
#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("a template is already registered for {}", path.display())]
  AlreadyExists { path: PathBuf },

  #[error(
    "cannot back up {}: {} through {} already exist\n\
     Remove old backups and run again.",
    path.display(), first.display(), last.display()
  )]
  BackupExhausted { path: PathBuf, first: PathBuf, last: PathBuf },

  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },

  #[error("failed to back up {} to {}: {source}", path.display(), backup.display())]
  Backup {
    path: PathBuf,
    backup: PathBuf,
    source: io::Error,
  },

  #[error("failed to restore {} from {}: {source}", path.display(), backup.display())]
  Restore {
    path: PathBuf,
    backup: PathBuf,
    source: io::Error,
  },

  #[error("failed to remove {}: {source}", path.display())]
  Remove { path: PathBuf, source: io::Error },

  #[error("invalid comment marker: {0}")]
  Pattern(#[from] regex::Error),

  #[error("unknown comment style '{name}' (expected shell, makefile, meta, ml or bat)")]
  UnknownCommentStyle { name: String },
}

/// Generated content for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  /// File reconciled against, and the registry key.
  pub path: PathBuf,
  /// Where to write instead of `path`, for previews.
  pub target: Option<PathBuf>,
  pub syntax: CommentSyntax,
  pub header: Vec<String>,
  pub body: Vec<String>,
  pub footer: Vec<String>,
  /// Mode given to the file when it is created.
  pub perm: u32,
  /// Maintain `# N "file"` directives (OCaml sources).
  pub line_directives: bool,
}

impl Template {
  pub fn new(path: impl Into<PathBuf>, syntax: CommentSyntax, body: Vec<String>) -> Self {
    Self {
      path: path.into(),
      target: None,
      syntax,
      header: Vec::new(),
      body,
      footer: Vec::new(),
      perm: DEFAULT_PERM,
      line_directives: false,
    }
  }

  /// Build a template from text that already carries the markers.
  ///
  /// Text without a start marker becomes the header of a template with an
  /// empty body.
  pub fn from_lines<I>(path: impl Into<PathBuf>, syntax: CommentSyntax, lines: I) -> Self
  where
    I: IntoIterator<Item = String>,
  {
    let sections = Sections::split(lines, &syntax);
    let body = match sections.body {
      BodyState::NoBody => Vec::new(),
      BodyState::Body(lines) | BodyState::BodyWithDigest(_, lines) => lines,
    };
    Self::new(path, syntax, body)
      .with_header(sections.header)
      .with_footer(sections.footer)
  }

  pub fn with_header(mut self, header: Vec<String>) -> Self {
    self.header = header;
    self
  }

  pub fn with_footer(mut self, footer: Vec<String>) -> Self {
    self.footer = footer;
    self
  }

  pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
    self.target = Some(target.into());
    self
  }

  pub fn with_perm(mut self, perm: u32) -> Self {
    self.perm = perm;
    self
  }

  pub fn with_line_directives(mut self) -> Self {
    self.line_directives = true;
    self
  }

  /// The file that gets written.
  pub fn target_path(&self) -> &Path {
    self.target.as_deref().unwrap_or(&self.path)
  }

  /// Content of a freshly created file.
  pub fn sections(&self) -> Sections {
    let sections = Sections {
      header: self.header.clone(),
      body: BodyState::Body(self.body.clone()),
      footer: self.footer.clone(),
    };
    if self.line_directives {
      annotate(sections, &self.path, &self.syntax)
    } else {
      sections
    }
  }

  /// Text of a freshly created file.
  pub fn render(&self) -> String {
    render(&self.sections(), &self.syntax)
  }
}

/// Serialize sections, stamping the digest of the body being written.
///
/// Without a body no marker is emitted.
pub fn render(sections: &Sections, syntax: &CommentSyntax) -> String {
  render_with(sections, syntax, "\n")
}

/// Like [`render`], ending each line with `newline`.
pub fn render_with(sections: &Sections, syntax: &CommentSyntax, newline: &str) -> String {
  let mut out = String::new();
  let mut push = |line: &str| {
    out.push_str(line);
    out.push_str(newline);
  };

  for line in &sections.header {
    push(line);
  }
  if let Some(body) = sections.body.lines() {
    push(&syntax.start_line());
    push(&syntax.digest_line(&Digest::stamp(body)));
    for line in body {
      push(line);
    }
    push(&syntax.stop_line());
  }
  for line in &sections.footer {
    push(line);
  }
  out
}
