//! Comment syntax descriptors.
//!
//! A managed file marks its generated section with comment lines, so the
//! splitter has to know how comments look in each file type.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::TemplateError;
use super::digest::Digest;
use crate::consts::{START_MARKER, STOP_MARKER};

/// How a file type writes single-line comments, with the sentinel matchers
/// derived from it.
#[derive(Debug, Clone)]
pub struct CommentSyntax {
  open: String,
  close: Option<String>,
  start: Regex,
  stop: Regex,
  digest: Regex,
}

impl CommentSyntax {
  /// Build a descriptor from an opening marker and an optional closing one.
  pub fn new(open: impl Into<String>, close: Option<&str>) -> Result<Self, TemplateError> {
    let open = open.into();
    let close = close.map(str::to_string);
    let start = build_matcher(&open, close.as_deref(), &regex::escape(START_MARKER))?;
    let stop = build_matcher(&open, close.as_deref(), &regex::escape(STOP_MARKER))?;
    let digest = build_matcher(&open, close.as_deref(), r"DO NOT EDIT \(digest: ([^()\s]*)\)")?;
    Ok(Self {
      open,
      close,
      start,
      stop,
      digest,
    })
  }

  pub fn open(&self) -> &str {
    &self.open
  }

  pub fn close(&self) -> Option<&str> {
    self.close.as_deref()
  }

  /// Wrap `text` in a comment.
  pub fn render(&self, text: &str) -> String {
    match &self.close {
      Some(close) => format!("{} {} {}", self.open, text, close),
      None => format!("{} {}", self.open, text),
    }
  }

  /// A pattern matching a whole comment line containing `text`, tolerant of
  /// surrounding whitespace and of a trailing `\r`.
  ///
  /// With `exact`, `text` is matched literally. Otherwise it is a regex
  /// fragment, typically carrying one capture group.
  pub fn matcher(&self, text: &str, exact: bool) -> Result<Regex, TemplateError> {
    let fragment = if exact { regex::escape(text) } else { text.to_string() };
    Ok(build_matcher(&self.open, self.close.as_deref(), &fragment)?)
  }

  pub fn start_line(&self) -> String {
    self.render(START_MARKER)
  }

  pub fn stop_line(&self) -> String {
    self.render(STOP_MARKER)
  }

  pub fn digest_line(&self, digest: &Digest) -> String {
    self.render(&format!("DO NOT EDIT (digest: {})", digest.to_hex()))
  }

  pub fn is_start(&self, line: &str) -> bool {
    self.start.is_match(line)
  }

  pub fn is_stop(&self, line: &str) -> bool {
    self.stop.is_match(line)
  }

  /// The hex digest recorded by a digest line, if `line` is one.
  pub fn recorded_digest<'a>(&self, line: &'a str) -> Option<&'a str> {
    self.digest.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
  }

  /// Shell-style comments (`# ...`).
  pub fn shell() -> Self {
    Self::fixed("#", None)
  }

  /// OCaml comments (`(* ... *)`).
  pub fn ml() -> Self {
    Self::fixed("(*", Some("*)"))
  }

  /// Batch-file comments (`rem ...`).
  pub fn bat() -> Self {
    Self::fixed("rem", None)
  }

  fn fixed(open: &str, close: Option<&str>) -> Self {
    // Markers are escaped before compilation, so this cannot fail.
    Self::new(open, close).expect("escaped comment markers form a valid regex")
  }
}

fn build_matcher(open: &str, close: Option<&str>, fragment: &str) -> Result<Regex, regex::Error> {
  let close = close.map(regex::escape).unwrap_or_default();
  Regex::new(&format!(
    r"^[ \t]*{}[ \t]*{}[ \t]*{}[ \t]*\r?$",
    regex::escape(open),
    fragment,
    close
  ))
}

impl PartialEq for CommentSyntax {
  fn eq(&self, other: &Self) -> bool {
    self.open == other.open && self.close == other.close
  }
}

impl Eq for CommentSyntax {}

/// Comment syntaxes of the file types the generator writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStyle {
  #[default]
  Shell,
  Makefile,
  /// findlib `META` files
  Meta,
  Ml,
  Bat,
}

impl CommentStyle {
  pub const ALL: [CommentStyle; 5] = [
    CommentStyle::Shell,
    CommentStyle::Makefile,
    CommentStyle::Meta,
    CommentStyle::Ml,
    CommentStyle::Bat,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Shell => "shell",
      Self::Makefile => "makefile",
      Self::Meta => "meta",
      Self::Ml => "ml",
      Self::Bat => "bat",
    }
  }

  pub fn syntax(&self) -> CommentSyntax {
    match self {
      Self::Shell | Self::Makefile | Self::Meta => CommentSyntax::shell(),
      Self::Ml => CommentSyntax::ml(),
      Self::Bat => CommentSyntax::bat(),
    }
  }
}

impl fmt::Display for CommentStyle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for CommentStyle {
  type Err = TemplateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|style| style.as_str() == s)
      .ok_or_else(|| TemplateError::UnknownCommentStyle { name: s.to_string() })
  }
}
