//! Batch descriptions read by `oasis generate`.
//!
//! ```json
//! {
//!   "flags": { "docs": true },
//!   "env": { "os_type": "Unix" },
//!   "templates": [
//!     {
//!       "path": "_tags",
//!       "comment": "shell",
//!       "body": [
//!         "<src/*.ml>: package(unix)",
//!         { "choose": [
//!           { "when": "true", "line": "true: -debug" },
//!           { "when": "flag(docs)", "line": "true: debug" }
//!         ] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! A `choose` item becomes the line of its last matching case.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use oasis_lib::consts::DEFAULT_PERM;
use oasis_lib::expr::{Choices, Env, Expr};
use oasis_lib::template::{CommentStyle, Registry, Template};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Batch {
  /// Variables overriding the host's test variables.
  #[serde(default)]
  pub env: BTreeMap<String, String>,
  #[serde(default)]
  pub flags: BTreeMap<String, bool>,
  pub templates: Vec<TemplateEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateEntry {
  pub path: PathBuf,
  #[serde(default)]
  pub target: Option<PathBuf>,
  #[serde(default)]
  pub comment: CommentStyle,
  #[serde(default)]
  pub header: Vec<String>,
  #[serde(default)]
  pub body: Vec<BodyItem>,
  #[serde(default)]
  pub footer: Vec<String>,
  /// Octal mode for created files, e.g. `"0755"`.
  #[serde(default)]
  pub perm: Option<String>,
  #[serde(default)]
  pub line_directives: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BodyItem {
  Line(String),
  Choose { choose: Vec<Case> },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Case {
  pub when: String,
  pub line: String,
}

impl Batch {
  pub fn load(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read batch file: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse batch file: {}", path.display()))
  }

  /// Host test variables, overridden by `env`, plus `flags`.
  pub fn environment(&self) -> Env {
    let mut env = Env::host();
    env.extend(self.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    for (name, value) in &self.flags {
      env.set_flag(name.clone(), *value);
    }
    env
  }

  /// Build the registry, resolving relative paths against `base`.
  pub fn into_registry(self, base: &Path, env: &Env) -> Result<Registry> {
    let mut registry = Registry::new();
    for entry in self.templates {
      let path = base.join(&entry.path);
      let template = entry
        .into_template(base, env)
        .with_context(|| format!("Invalid template for {}", path.display()))?;
      registry.add(template)?;
    }
    Ok(registry)
  }
}

impl TemplateEntry {
  fn into_template(self, base: &Path, env: &Env) -> Result<Template> {
    let mut body = Vec::with_capacity(self.body.len());
    for item in self.body {
      body.push(resolve_item(item, env)?);
    }

    let mut template = Template::new(base.join(&self.path), self.comment.syntax(), body)
      .with_header(self.header)
      .with_footer(self.footer)
      .with_perm(parse_perm(self.perm.as_deref())?);
    if let Some(target) = self.target {
      template = template.with_target(base.join(target));
    }
    if self.line_directives {
      template = template.with_line_directives();
    }
    Ok(template)
  }
}

fn resolve_item(item: BodyItem, env: &Env) -> Result<String> {
  match item {
    BodyItem::Line(line) => Ok(line),
    BodyItem::Choose { choose } => {
      let mut choices = Choices::new();
      for case in choose {
        let condition: Expr = case.when.parse()?;
        choices.push(condition, case.line);
      }
      Ok(choices.resolve(env)?.clone())
    }
  }
}

fn parse_perm(raw: Option<&str>) -> Result<u32> {
  let Some(raw) = raw else {
    return Ok(DEFAULT_PERM);
  };
  let digits = raw.trim_start_matches("0o");
  let perm = u32::from_str_radix(digits, 8).with_context(|| format!("Invalid octal mode: {raw}"))?;
  if perm > 0o7777 {
    bail!("Invalid octal mode: {raw}");
  }
  Ok(perm)
}
