//! Helper registry: stores helpers under their canonical names.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use minijinja::{Error, Value};
use tracing::debug;

use super::{canonical_name, Helper, HelperUnit};
use crate::error::RegistryError;

/// Named helpers available to templates.
///
/// Names are always lower-cased. Registering a name that already exists
/// replaces the previous helper; the last registration wins.
///
/// Cloning a registry is cheap: helpers are reference counted, and the
/// clone can be mutated without affecting the original.
#[derive(Clone, Default)]
pub struct HelperRegistry {
    entries: HashMap<String, HelperUnit>,
}

impl HelperRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a structured helper under the name derived from its identity.
    ///
    /// Returns the canonical name it was stored under.
    pub fn register<H>(&mut self, helper: H) -> Result<String, RegistryError>
    where
        H: Helper + 'static,
    {
        self.register_shared(Arc::new(helper))
    }

    /// Registers an already shared structured helper under its derived name.
    pub fn register_shared(&mut self, helper: Arc<dyn Helper>) -> Result<String, RegistryError> {
        let identity = helper.identity();
        let name = canonical_name(identity);
        validate_name(identity, &name)?;
        self.insert(name, HelperUnit::Structured(helper))
    }

    /// Registers a helper under an explicit name.
    ///
    /// The name is lower-cased; no suffix or namespace stripping applies.
    pub fn register_as(
        &mut self,
        name: impl AsRef<str>,
        unit: HelperUnit,
    ) -> Result<String, RegistryError> {
        let given = name.as_ref();
        let name = given.to_lowercase();
        validate_name(given, &name)?;
        self.insert(name, unit)
    }

    /// Registers a plain callable. Its output is always escaped.
    pub fn register_fn<F>(&mut self, name: impl AsRef<str>, func: F) -> Result<String, RegistryError>
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        self.register_as(name, HelperUnit::plain(func))
    }

    /// Returns the helper stored under `name`.
    ///
    /// Lookup is exact: callers pass canonical (lower-case) names.
    pub fn get(&self, name: &str) -> Option<&HelperUnit> {
        self.entries.get(name)
    }

    /// Returns true if a helper is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Removes a helper, returning it if it was registered.
    pub fn remove(&mut self, name: &str) -> Option<HelperUnit> {
        self.entries.remove(&name.to_lowercase())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: String, unit: HelperUnit) -> Result<String, RegistryError> {
        if let Some(previous) = self.entries.insert(name.clone(), unit) {
            debug!(helper = %name, ?previous, "replaced previously registered helper");
        } else {
            debug!(helper = %name, "registered helper");
        }
        Ok(name)
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperRegistry")
            .field("names", &self.names())
            .finish()
    }
}

fn validate_name(given: &str, name: &str) -> Result<(), RegistryError> {
    if name.is_empty() {
        return Err(RegistryError::invalid(given, "helper name is empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(RegistryError::invalid(
            given,
            "helper name cannot contain whitespace",
        ));
    }
    Ok(())
}
