//! Conditional expressions.
//!
//! Package descriptions attach boolean conditions to values: a flag default,
//! a dependency list that only applies on one platform, and so on. This module
//! provides:
//! - `Expr`: the condition tree, evaluated against an [`Environment`]
//! - `Choices`: ordered `(condition, value)` lists resolved to a single value
//! - `Env`: an owned environment, optionally seeded from the running host
//!
//! Conditions use the description-file syntax, e.g.
//! `flag(docs) && !os_type(Win32)`; see [`Expr::from_str`](std::str::FromStr).

mod choices;
mod env;
mod parse;

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

pub use choices::Choices;
pub use env::{Env, Environment};

/// Errors raised while evaluating or parsing conditions.
///
/// All of these are configuration errors: they are reported and the artifact
/// being generated is abandoned, nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
  #[error("undefined variable '{name}'")]
  UndefinedVariable { name: String },

  #[error("flag '{name}' has value '{value}', expected 'true' or 'false'")]
  InvalidFlagValue { name: String, value: String },

  #[error("unknown flag '{name}'")]
  UnknownFlag { name: String },

  #[error("no matching choice among [{conditions}]")]
  NoMatchingChoice { conditions: String },

  #[error("invalid expression '{input}': {message}")]
  Parse { input: String, message: String },
}

/// A boolean condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
  Const(bool),
  Not(Box<Expr>),
  And(Box<Expr>, Box<Expr>),
  Or(Box<Expr>, Box<Expr>),
  /// Reference to a flag; the environment holds `"true"` or `"false"` for it.
  Flag(String),
  /// `var(value)`: string equality against a variable.
  Test(String, String),
}

impl Expr {
  pub fn flag(name: impl Into<String>) -> Self {
    Expr::Flag(name.into())
  }

  pub fn test(var: impl Into<String>, value: impl Into<String>) -> Self {
    Expr::Test(var.into(), value.into())
  }

  #[allow(clippy::should_implement_trait)]
  pub fn not(self) -> Self {
    Expr::Not(Box::new(self))
  }

  pub fn and(self, other: Expr) -> Self {
    Expr::And(Box::new(self), Box::new(other))
  }

  pub fn or(self, other: Expr) -> Self {
    Expr::Or(Box::new(self), Box::new(other))
  }

  /// Evaluate the condition.
  ///
  /// # Errors
  ///
  /// - `UndefinedVariable` if a flag or test variable is missing from `env`
  /// - `InvalidFlagValue` if a flag's value is not exactly `"true"` or `"false"`
  pub fn evaluate<E: Environment + ?Sized>(&self, env: &E) -> Result<bool, ExprError> {
    match self {
      Expr::Const(b) => Ok(*b),
      Expr::Not(e) => Ok(!e.evaluate(env)?),
      Expr::And(a, b) => Ok(a.evaluate(env)? && b.evaluate(env)?),
      Expr::Or(a, b) => Ok(a.evaluate(env)? || b.evaluate(env)?),
      Expr::Flag(name) => match lookup(env, name)? {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ExprError::InvalidFlagValue {
          name: name.clone(),
          value: other.to_string(),
        }),
      },
      Expr::Test(var, value) => Ok(lookup(env, var)? == value),
    }
  }

  /// Names of all flags referenced by this condition.
  pub fn flags(&self) -> BTreeSet<&str> {
    let mut out = BTreeSet::new();
    self.collect_flags(&mut out);
    out
  }

  fn collect_flags<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
    match self {
      Expr::Const(_) | Expr::Test(..) => {}
      Expr::Not(e) => e.collect_flags(out),
      Expr::And(a, b) | Expr::Or(a, b) => {
        a.collect_flags(out);
        b.collect_flags(out);
      }
      Expr::Flag(name) => {
        out.insert(name);
      }
    }
  }

  /// Check that every referenced flag is declared.
  pub fn check<S: AsRef<str>>(&self, known_flags: &[S]) -> Result<(), ExprError> {
    for name in self.flags() {
      if !known_flags.iter().any(|k| k.as_ref() == name) {
        return Err(ExprError::UnknownFlag { name: name.to_string() });
      }
    }
    Ok(())
  }

  fn precedence(&self) -> u8 {
    match self {
      Expr::Or(..) => 1,
      Expr::And(..) => 2,
      Expr::Not(_) => 3,
      Expr::Const(_) | Expr::Flag(_) | Expr::Test(..) => 4,
    }
  }

  fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
    if self.precedence() < min {
      write!(f, "({self})")
    } else {
      write!(f, "{self}")
    }
  }
}

fn lookup<'e, E: Environment + ?Sized>(env: &'e E, name: &str) -> Result<&'e str, ExprError> {
  env
    .lookup(name)
    .ok_or_else(|| ExprError::UndefinedVariable { name: name.to_string() })
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Expr::Const(b) => write!(f, "{b}"),
      Expr::Not(e) => {
        write!(f, "!")?;
        e.fmt_operand(f, 3)
      }
      // Both connectives are left-associative, so only the right operand
      // needs parentheses at equal precedence.
      Expr::And(a, b) => {
        a.fmt_operand(f, 2)?;
        write!(f, " && ")?;
        b.fmt_operand(f, 3)
      }
      Expr::Or(a, b) => {
        a.fmt_operand(f, 1)?;
        write!(f, " || ")?;
        b.fmt_operand(f, 2)
      }
      Expr::Flag(name) => write!(f, "flag({name})"),
      Expr::Test(var, value) => write!(f, "{var}({value})"),
    }
  }
}

impl std::str::FromStr for Expr {
  type Err = ExprError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse::parse_expr(s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn env() -> Env {
    Env::new()
      .with_flag("docs", true)
      .with_flag("tests", false)
      .with_var("os_type", "Unix")
  }

  #[test]
  fn evaluates_connectives() {
    let env = env();
    let expr = Expr::flag("docs").and(Expr::test("os_type", "Win32").not());
    assert!(expr.evaluate(&env).unwrap());

    let expr = Expr::flag("tests").or(Expr::Const(false));
    assert!(!expr.evaluate(&env).unwrap());
  }

  #[test]
  fn test_is_plain_string_equality() {
    let env = env();
    assert!(Expr::test("os_type", "Unix").evaluate(&env).unwrap());
    assert!(!Expr::test("os_type", "unix").evaluate(&env).unwrap());
  }

  #[test]
  fn missing_flag_is_undefined() {
    let err = Expr::flag("nope").evaluate(&env()).unwrap_err();
    assert_eq!(err, ExprError::UndefinedVariable { name: "nope".into() });
  }

  #[test]
  fn missing_test_variable_is_undefined() {
    let err = Expr::test("system", "linux").evaluate(&env()).unwrap_err();
    assert!(matches!(err, ExprError::UndefinedVariable { name } if name == "system"));
  }

  #[test]
  fn flag_must_be_literal_boolean() {
    let env = Env::new().with_var("docs", "yes");
    let err = Expr::flag("docs").evaluate(&env).unwrap_err();
    assert_eq!(
      err,
      ExprError::InvalidFlagValue {
        name: "docs".into(),
        value: "yes".into()
      }
    );
  }

  #[test]
  fn collects_and_checks_flags() {
    let expr = Expr::flag("a").and(Expr::flag("b").or(Expr::test("system", "linux")));
    assert_eq!(expr.flags().into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    assert!(expr.check(&["a", "b", "c"]).is_ok());
    assert_eq!(
      expr.check(&["a"]).unwrap_err(),
      ExprError::UnknownFlag { name: "b".into() }
    );
  }

  #[test]
  fn display_parenthesizes_only_when_needed() {
    let expr = Expr::flag("a").or(Expr::flag("b")).and(Expr::test("os_type", "Unix").not());
    assert_eq!(expr.to_string(), "(flag(a) || flag(b)) && !os_type(Unix)");

    let expr = Expr::flag("a").and(Expr::flag("b")).or(Expr::Const(true));
    assert_eq!(expr.to_string(), "flag(a) && flag(b) || true");

    let expr = Expr::flag("a").and(Expr::flag("b")).not();
    assert_eq!(expr.to_string(), "!(flag(a) && flag(b))");
  }

  #[test]
  fn display_output_parses_back() {
    let expr = Expr::flag("a")
      .or(Expr::flag("b").or(Expr::Const(false)))
      .and(Expr::test("system", "macosx").not().not());
    let reparsed: Expr = expr.to_string().parse().unwrap();
    assert_eq!(reparsed.to_string(), expr.to_string());
    assert_eq!(reparsed, expr);
  }
}
