//! Variable and flag lookup for condition evaluation.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::platform;

/// Lookup of variables and flags by name.
///
/// Flags are stored as the literal strings `"true"` and `"false"`; anything
/// else is rejected when a condition references the flag.
pub trait Environment {
  fn lookup(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> Environment for HashMap<String, String, S> {
  fn lookup(&self, name: &str) -> Option<&str> {
    self.get(name).map(String::as_str)
  }
}

impl Environment for BTreeMap<String, String> {
  fn lookup(&self, name: &str) -> Option<&str> {
    self.get(name).map(String::as_str)
  }
}

/// An owned environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
  vars: BTreeMap<String, String>,
}

impl Env {
  pub fn new() -> Self {
    Self::default()
  }

  /// Environment seeded with the standard test variables of the running host
  /// (`os_type`, `system`, `architecture`).
  pub fn host() -> Self {
    let mut env = Self::new();
    for (name, value) in platform::host_variables() {
      env.set(name, value);
    }
    env
  }

  pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
    self.vars.insert(name.into(), value.into());
  }

  pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
    self.set(name, if value { "true" } else { "false" });
  }

  pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.set(name, value);
    self
  }

  pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
    self.set_flag(name, value);
    self
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.vars.get(name).map(String::as_str)
  }
}

impl Environment for Env {
  fn lookup(&self, name: &str) -> Option<&str> {
    self.get(name)
  }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Env {
  fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
    for (k, v) in iter {
      self.set(k, v);
    }
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Env {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut env = Env::new();
    env.extend(iter);
    env
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flags_are_stored_as_literals() {
    let env = Env::new().with_flag("on", true).with_flag("off", false);
    assert_eq!(env.lookup("on"), Some("true"));
    assert_eq!(env.lookup("off"), Some("false"));
  }

  #[test]
  fn later_values_replace_earlier_ones() {
    let env: Env = [("system", "linux"), ("system", "freebsd")].into_iter().collect();
    assert_eq!(env.get("system"), Some("freebsd"));
  }

  #[test]
  fn host_environment_is_overridable() {
    let mut env = Env::host();
    env.set(platform::OS_TYPE, "Win32");
    assert_eq!(env.lookup(platform::OS_TYPE), Some("Win32"));
  }

  #[test]
  fn std_maps_are_environments() {
    let mut map = HashMap::new();
    map.insert("a".to_string(), "1".to_string());
    assert_eq!(map.lookup("a"), Some("1"));
    assert_eq!(map.lookup("b"), None);
  }
}
