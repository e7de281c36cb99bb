//! The set of templates pending generation in one run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::error;

use super::generate::{GenerateOptions, Outcome, generate, rollback};
use super::{Template, TemplateError};

/// Templates keyed by the path they reconcile against.
///
/// Adding a second template for the same path is an error: two generators
/// producing the same file in one run is a bug in the caller.
#[derive(Debug, Clone, Default)]
pub struct Registry {
  templates: HashMap<PathBuf, Template>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a template.
  ///
  /// # Errors
  ///
  /// `AlreadyExists` if a template is registered for the same path.
  pub fn add(&mut self, template: Template) -> Result<(), TemplateError> {
    if self.templates.contains_key(&template.path) {
      return Err(TemplateError::AlreadyExists { path: template.path });
    }
    self.templates.insert(template.path.clone(), template);
    Ok(())
  }

  /// Register a template, returning the one it replaces.
  pub fn replace(&mut self, template: Template) -> Option<Template> {
    self.templates.insert(template.path.clone(), template)
  }

  pub fn find(&self, path: &Path) -> Option<&Template> {
    self.templates.get(path)
  }

  pub fn remove(&mut self, path: &Path) -> Option<Template> {
    self.templates.remove(path)
  }

  pub fn contains(&self, path: &Path) -> bool {
    self.templates.contains_key(path)
  }

  pub fn len(&self) -> usize {
    self.templates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.templates.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Template> {
    self.templates.values()
  }

  /// Generate every template.
  ///
  /// A failing template does not stop the others. Results are ordered by
  /// path so reports are stable.
  pub fn generate_all(&self, options: &GenerateOptions) -> Vec<(PathBuf, Result<Outcome, TemplateError>)> {
    let mut paths: Vec<&PathBuf> = self.templates.keys().collect();
    paths.sort();

    paths
      .into_iter()
      .map(|path| {
        let result = generate(&self.templates[path], options);
        if let Err(e) = &result {
          error!(path = %path.display(), error = %e, "generation failed");
        }
        (path.clone(), result)
      })
      .collect()
  }

  /// Roll back outcomes in reverse order, stopping at the first failure.
  pub fn rollback_all<'a, I>(outcomes: I) -> Result<(), TemplateError>
  where
    I: IntoIterator<Item = &'a Outcome>,
    I::IntoIter: DoubleEndedIterator,
  {
    for outcome in outcomes.into_iter().rev() {
      rollback(outcome)?;
    }
    Ok(())
  }
}

impl IntoIterator for Registry {
  type Item = Template;
  type IntoIter = std::collections::hash_map::IntoValues<PathBuf, Template>;

  fn into_iter(self) -> Self::IntoIter {
    self.templates.into_values()
  }
}

impl Extend<Template> for Registry {
  /// Later templates replace earlier ones for the same path.
  fn extend<I: IntoIterator<Item = Template>>(&mut self, iter: I) {
    for template in iter {
      self.replace(template);
    }
  }
}
