//! Ordered choice lists.

use super::{Environment, Expr, ExprError};

/// An ordered list of `(condition, value)` pairs.
///
/// Declaration order matters: when several conditions hold, the entry declared
/// **last** wins. A description like
///
/// ```text
/// Install: true
/// if os_type(Win32)
///   Install: false
/// ```
///
/// produces `[(true, true), (os_type(Win32), false)]`, and on Windows the later
/// `false` must override the earlier default. [`Choices::resolve`] therefore
/// scans from the last entry backwards and stops at the first match; a
/// front-to-back scan would always return the unconditional default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choices<T> {
  entries: Vec<(Expr, T)>,
}

impl<T> Default for Choices<T> {
  fn default() -> Self {
    Self { entries: Vec::new() }
  }
}

impl<T> Choices<T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// A list with a single unconditional entry.
  pub fn always(value: T) -> Self {
    Self {
      entries: vec![(Expr::Const(true), value)],
    }
  }

  /// Append an entry; it takes priority over every entry already present.
  pub fn push(&mut self, condition: Expr, value: T) {
    self.entries.push((condition, value));
  }

  pub fn with(mut self, condition: Expr, value: T) -> Self {
    self.push(condition, value);
    self
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Entries in declaration order.
  pub fn iter(&self) -> impl Iterator<Item = (&Expr, &T)> {
    self.entries.iter().map(|(e, v)| (e, v))
  }

  /// Pick the value of the last-declared entry whose condition holds.
  ///
  /// # Errors
  ///
  /// - `NoMatchingChoice` if the list is empty or no condition holds
  /// - any evaluation error raised by a condition visited before a match
  pub fn resolve<E: Environment + ?Sized>(&self, env: &E) -> Result<&T, ExprError> {
    for (condition, value) in self.entries.iter().rev() {
      if condition.evaluate(env)? {
        return Ok(value);
      }
    }
    Err(ExprError::NoMatchingChoice {
      conditions: self
        .entries
        .iter()
        .map(|(e, _)| e.to_string())
        .collect::<Vec<_>>()
        .join(", "),
    })
  }

  /// Choice list for an `if cond ... else ...` block.
  ///
  /// Each `then` entry is guarded by `cond`, each `otherwise` entry by
  /// `!cond`. Then-entries come first so declaration order is kept.
  pub fn if_then_else(cond: Expr, then: Choices<T>, otherwise: Choices<T>) -> Self {
    let mut entries = Vec::with_capacity(then.len() + otherwise.len());
    for (e, v) in then.entries {
      entries.push((cond.clone().and(e), v));
    }
    for (e, v) in otherwise.entries {
      entries.push((cond.clone().not().and(e), v));
    }
    Self { entries }
  }

  /// Append every entry of `later`, which then overrides this list.
  pub fn extend(&mut self, later: Choices<T>) {
    self.entries.extend(later.entries);
  }
}

impl<T> FromIterator<(Expr, T)> for Choices<T> {
  fn from_iter<I: IntoIterator<Item = (Expr, T)>>(iter: I) -> Self {
    Self {
      entries: iter.into_iter().collect(),
    }
  }
}

impl<T> From<Vec<(Expr, T)>> for Choices<T> {
  fn from(entries: Vec<(Expr, T)>) -> Self {
    Self { entries }
  }
}
