//! Splitting file content into header, managed body and footer.

use tracing::warn;

use super::render_with;
use super::comment::CommentSyntax;
use super::digest::Digest;

/// State of the managed section of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyState {
  /// No start sentinel: the file has no managed section.
  NoBody,
  /// A managed section without a digest line.
  Body(Vec<String>),
  /// A managed section with the digest recorded when it was written.
  BodyWithDigest(Digest, Vec<String>),
}

impl BodyState {
  pub fn lines(&self) -> Option<&[String]> {
    match self {
      BodyState::NoBody => None,
      BodyState::Body(lines) | BodyState::BodyWithDigest(_, lines) => Some(lines),
    }
  }

  pub fn is_present(&self) -> bool {
    !matches!(self, BodyState::NoBody)
  }

  /// Body text as compared between runs: the lines joined by `\n`.
  pub fn joined(&self) -> Option<String> {
    self.lines().map(|lines| lines.join("\n"))
  }
}

/// A file split around its managed section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sections {
  pub header: Vec<String>,
  pub body: BodyState,
  pub footer: Vec<String>,
}

impl Sections {
  /// Split raw lines.
  ///
  /// Lines up to the start sentinel form the header. A digest line directly
  /// after the start sentinel is consumed and decoded. Lines up to the stop
  /// sentinel form the body and the rest is footer.
  ///
  /// Two inputs are recovered rather than rejected:
  /// - no start sentinel: everything is header, the body is `NoBody`
  /// - no stop sentinel: everything after the start is body, footer is empty
  pub fn split<I>(lines: I, syntax: &CommentSyntax) -> Self
  where
    I: IntoIterator<Item = String>,
  {
    let mut lines = lines.into_iter().map(strip_cr).peekable();

    let mut header = Vec::new();
    let mut found_start = false;
    for line in lines.by_ref() {
      if syntax.is_start(&line) {
        found_start = true;
        break;
      }
      header.push(line);
    }

    if !found_start {
      return Self {
        header,
        body: BodyState::NoBody,
        footer: Vec::new(),
      };
    }

    let recorded = lines
      .peek()
      .and_then(|line| syntax.recorded_digest(line))
      .map(decode_digest);
    if recorded.is_some() {
      lines.next();
    }

    let mut body = Vec::new();
    let mut found_stop = false;
    for line in lines.by_ref() {
      if syntax.is_stop(&line) {
        found_stop = true;
        break;
      }
      body.push(line);
    }

    if !found_stop {
      warn!("managed section has no stop marker, treating the rest of the file as generated");
    }

    let footer: Vec<String> = lines.collect();
    let body = match recorded {
      Some(digest) => BodyState::BodyWithDigest(digest, body),
      None => BodyState::Body(body),
    };

    Self { header, body, footer }
  }

  /// Split text, one line per `\n`.
  pub fn split_str(content: &str, syntax: &CommentSyntax) -> Self {
    Self::split(content.lines().map(str::to_string), syntax)
  }
}

fn strip_cr(mut line: String) -> String {
  if line.ends_with('\r') {
    line.pop();
  }
  line
}

/// A file read from disk, split around its managed section.
///
/// `sections` is the decoded view used to compare bodies and check digests.
/// The bytes before the start sentinel and after the stop sentinel are kept
/// as read, so rewriting the section leaves them untouched whatever their
/// encoding or line endings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
  pub sections: Sections,
  header: Vec<u8>,
  footer: Vec<u8>,
  /// Line ending of the start sentinel, reused for the lines written.
  newline: &'static str,
  /// Whether the stop sentinel was followed by a line ending.
  stop_terminated: bool,
  ends_with_newline: bool,
  utf8: bool,
}

impl RawFile {
  pub fn parse(content: &[u8], syntax: &CommentSyntax) -> Self {
    let raw: Vec<&[u8]> = content.split_inclusive(|&b| b == b'\n').collect();
    let sections = Sections::split(raw.iter().map(|line| decode_line(line)), syntax);
    let ends_with_newline = content.is_empty() || content.ends_with(b"\n");
    let utf8 = std::str::from_utf8(content).is_ok();

    let Some(body) = sections.body.lines() else {
      return Self {
        sections,
        header: content.to_vec(),
        footer: Vec::new(),
        newline: newline_of(raw.first().copied()),
        stop_terminated: true,
        ends_with_newline,
        utf8,
      };
    };

    let start = sections.header.len();
    let digest = usize::from(matches!(sections.body, BodyState::BodyWithDigest(..)));
    let stop = start + 1 + digest + body.len();

    Self {
      header: raw[..start].concat(),
      footer: raw.get(stop + 1..).map(|lines| lines.concat()).unwrap_or_default(),
      newline: newline_of(raw.get(start).copied()),
      stop_terminated: raw.get(stop).is_none_or(|line| line.ends_with(b"\n")),
      ends_with_newline,
      utf8,
      sections,
    }
  }

  /// Whether the whole file decoded as UTF-8 without replacement.
  pub fn is_utf8(&self) -> bool {
    self.utf8
  }

  /// The file with its managed section holding `body` and every byte
  /// outside the section as it was.
  pub fn rewrite(&self, body: &[String], syntax: &CommentSyntax) -> Vec<u8> {
    let managed = Sections {
      header: Vec::new(),
      body: BodyState::Body(body.to_vec()),
      footer: Vec::new(),
    };
    let mut section = render_with(&managed, syntax, self.newline);
    if !self.stop_terminated {
      section.truncate(section.len() - self.newline.len());
    }

    let mut out = Vec::with_capacity(self.header.len() + section.len() + self.footer.len());
    out.extend_from_slice(&self.header);
    out.extend_from_slice(section.as_bytes());
    out.extend_from_slice(&self.footer);
    out
  }

  /// Serialize `sections` in place of the whole file, keeping the file's
  /// line endings and its final newline (or lack of one).
  pub fn render(&self, sections: &Sections, syntax: &CommentSyntax) -> Vec<u8> {
    let mut text = render_with(sections, syntax, self.newline);
    if !self.ends_with_newline && text.ends_with(self.newline) {
      text.truncate(text.len() - self.newline.len());
    }
    text.into_bytes()
  }
}

fn decode_line(raw: &[u8]) -> String {
  let line = raw.strip_suffix(b"\n").unwrap_or(raw);
  String::from_utf8_lossy(line).into_owned()
}

fn newline_of(line: Option<&[u8]>) -> &'static str {
  match line {
    Some(line) if line.ends_with(b"\r\n") => "\r\n",
    _ => "\n",
  }
}

fn decode_digest(hex: &str) -> Digest {
  // An undecodable digest can never match, so the section is treated as edited.
  Digest::from_hex(hex).unwrap_or_else(|e| {
    warn!(digest = hex, error = %e, "malformed digest in managed section");
    Digest::default()
  })
}
