//! Implementation of the `oasis eval` command.

use anyhow::{Context, Result, bail};

use oasis_lib::expr::{Env, Expr};

use crate::output::{OutputFormat, print_json};

/// Evaluate a condition and print `true` or `false`.
///
/// `defines` are `key=value` test variables, `flags` are `name=bool`. Both
/// override the host variables unless `no_host` is set.
pub fn cmd_eval(expr: &str, defines: &[String], flags: &[String], no_host: bool, format: OutputFormat) -> Result<()> {
  let expr: Expr = expr.parse()?;

  let mut env = if no_host { Env::new() } else { Env::host() };
  for define in defines {
    let (key, value) = split_pair(define)?;
    env.set(key, value);
  }
  for flag in flags {
    let (name, value) = split_pair(flag)?;
    let value: bool = value
      .parse()
      .with_context(|| format!("Flag {name} must be true or false, got '{value}'"))?;
    env.set_flag(name, value);
  }

  let value = expr.evaluate(&env)?;

  if format.is_json() {
    print_json(&serde_json::json!({ "expr": expr.to_string(), "value": value }))?;
  } else {
    println!("{value}");
  }
  Ok(())
}

fn split_pair(raw: &str) -> Result<(&str, &str)> {
  match raw.split_once('=') {
    Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
    _ => bail!("Expected key=value, got '{raw}'"),
  }
}
