//! Configuration store and composer configuration.
//!
//! Settings are looked up by dotted key (`"output.late"`). Two stores are
//! provided: [`MapSettings`] for values built in code, and [`YamlSettings`]
//! for a nested YAML document such as:
//!
//! ```yaml
//! output:
//!   late: true
//! url:
//!   base: /app
//! ```
//!
//! [`ComposerConfig`] is what a [`ResponseComposer`](crate::ResponseComposer)
//! is actually built from: the deferred-output flag (read once) and the list
//! of default helpers.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ferrule_render::Helper;
use serde_json::Value;

/// Key controlling deferred output.
pub const DEFERRED_OUTPUT_KEY: &str = "output.late";

/// Deferred output is on unless configured otherwise.
pub const DEFERRED_OUTPUT_DEFAULT: bool = true;

/// A read-only configuration store.
pub trait Settings: Send + Sync {
    /// Returns the value stored under a dotted key.
    fn get(&self, key: &str) -> Option<Value>;

    /// Returns the value under `key`, or `default`.
    fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Reads a boolean. Non-boolean values count as `default`.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }
}

/// Flat store keyed by full dotted keys.
#[derive(Debug, Clone, Default)]
pub struct MapSettings {
    values: HashMap<String, Value>,
}

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value (builder style).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }
}

impl Settings for MapSettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

/// Error loading a YAML settings document.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings document: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Nested settings document with dotted-path lookup.
#[derive(Debug, Clone, Default)]
pub struct YamlSettings {
    root: Value,
}

impl YamlSettings {
    /// Parses a YAML document.
    pub fn from_yaml(source: &str) -> Result<Self, SettingsError> {
        let root: Value = serde_yaml::from_str(source)?;
        Ok(Self { root })
    }

    /// Reads and parses a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml(&source)
    }
}

impl Settings for YamlSettings {
    fn get(&self, key: &str) -> Option<Value> {
        key.split('.')
            .try_fold(&self.root, |node, segment| node.get(segment))
            .cloned()
    }
}

impl<S: Settings + ?Sized> Settings for Arc<S> {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }
}

/// Construction-time configuration of a composer.
#[derive(Clone)]
pub struct ComposerConfig {
    /// Whether headers and body are held until emission.
    pub deferred: bool,
    /// Structured helpers registered, in order, under their derived names.
    pub default_helpers: Vec<Arc<dyn Helper>>,
}

impl ComposerConfig {
    /// Deferred output with the built-in `url`, `config` and `using`
    /// helpers reading an empty settings store.
    pub fn new() -> Self {
        Self::from_settings(Arc::new(MapSettings::new()))
    }

    /// Deferred output with no helpers at all.
    pub fn empty() -> Self {
        Self {
            deferred: DEFERRED_OUTPUT_DEFAULT,
            default_helpers: Vec::new(),
        }
    }

    /// Reads the deferred-output flag from `settings` and seeds the
    /// built-in helpers with the same store.
    pub fn from_settings(settings: Arc<dyn Settings>) -> Self {
        Self {
            deferred: settings.get_bool(DEFERRED_OUTPUT_KEY, DEFERRED_OUTPUT_DEFAULT),
            default_helpers: crate::helpers::default_helpers(settings),
        }
    }

    pub fn deferred(mut self, deferred: bool) -> Self {
        self.deferred = deferred;
        self
    }

    /// Appends a default helper.
    pub fn helper<H: Helper + 'static>(mut self, helper: H) -> Self {
        self.default_helpers.push(Arc::new(helper));
        self
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComposerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let helpers: Vec<&str> = self.default_helpers.iter().map(|h| h.identity()).collect();
        f.debug_struct("ComposerConfig")
            .field("deferred", &self.deferred)
            .field("default_helpers", &helpers)
            .finish()
    }
}
