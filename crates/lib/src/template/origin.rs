//! Line directives for generated OCaml sources.
//!
//! A generated `.ml` file embeds code copied from elsewhere, often preceded by
//! `# 12 "src/foo.ml"` directives so compiler errors point at the original.
//! Those originals rarely exist where the generated file is compiled, so
//! directives naming a missing file are turned into comments. Fresh directives
//! naming the generated file itself are then placed at the top of the header,
//! the top of the body and the top of the footer, so each region maps back to
//! its real line numbers.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::comment::CommentSyntax;
use super::split::{BodyState, Sections};

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"^[ \t]*#[ \t]*([0-9]+)[ \t]+"((?:[^"\\]|\\.)*)"[ \t]*$"#).expect("directive regex is valid")
});

/// A parsed `# <line> "<file>"` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDirective {
  pub line: usize,
  pub file: String,
}

impl LineDirective {
  pub fn new(line: usize, file: impl Into<String>) -> Self {
    Self { line, file: file.into() }
  }

  pub fn parse(text: &str) -> Option<Self> {
    let caps = DIRECTIVE_RE.captures(text)?;
    let line = caps[1].parse().ok()?;
    let file = caps[2].replace("\\\"", "\"").replace("\\\\", "\\");
    Some(Self { line, file })
  }

  pub fn render(&self) -> String {
    let escaped = self.file.replace('\\', "\\\\").replace('"', "\\\"");
    format!("# {} \"{}\"", self.line, escaped)
  }
}

/// Number of physical lines in an entry; entries may hold embedded newlines.
pub fn physical_lines(entry: &str) -> usize {
  1 + entry.matches('\n').count()
}

fn count_lines(entries: &[String]) -> usize {
  entries.iter().map(|e| physical_lines(e)).sum()
}

/// Comment out directives naming a file that does not exist.
///
/// Relative names are resolved against `base`. Directives naming `own` (the
/// generated file) are left alone. Every entry keeps its number of physical
/// lines.
pub fn neutralize(entries: &[String], base: &Path, own: &str, syntax: &CommentSyntax) -> Vec<String> {
  entries
    .iter()
    .map(|entry| {
      entry
        .split('\n')
        .map(|line| match LineDirective::parse(line) {
          Some(d) if d.file != own && !base.join(&d.file).exists() => {
            warn!(directive = line, "line directive names a missing file, commenting it out");
            syntax.render(line.trim())
          }
          _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
    })
    .collect()
}

/// Neutralize stale directives and refresh the directives naming `file`.
///
/// Files without a managed section are returned untouched.
pub fn annotate(sections: Sections, file: &Path, syntax: &CommentSyntax) -> Sections {
  if !sections.body.is_present() {
    return sections;
  }
  let body = sections.body.lines().unwrap_or_default();

  let own = file
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| file.display().to_string());
  let base = file.parent().unwrap_or_else(|| Path::new("."));

  let header = strip_own(neutralize(&sections.header, base, &own, syntax), &own);
  let body = strip_own(neutralize(body, base, &own, syntax), &own);
  let footer = strip_own(neutralize(&sections.footer, base, &own, syntax), &own);

  // Layout of the written file, with N the line following a directive:
  //   directive, header, start, digest, directive, body, stop, directive, footer
  let h = count_lines(&header);
  let b = count_lines(&body);
  let header_line = 2;
  let body_line = h + 5;
  let footer_line = h + b + 7;

  Sections {
    header: with_directive(LineDirective::new(header_line, own.as_str()), header),
    body: BodyState::Body(with_directive(LineDirective::new(body_line, own.as_str()), body)),
    footer: with_directive(LineDirective::new(footer_line, own.as_str()), footer),
  }
}

fn strip_own(mut entries: Vec<String>, own: &str) -> Vec<String> {
  if entries
    .first()
    .and_then(|first| LineDirective::parse(first))
    .is_some_and(|d| d.file == own)
  {
    entries.remove(0);
  }
  entries
}

fn with_directive(directive: LineDirective, entries: Vec<String>) -> Vec<String> {
  let mut out = Vec::with_capacity(entries.len() + 1);
  out.push(directive.render());
  out.extend(entries);
  out
}
