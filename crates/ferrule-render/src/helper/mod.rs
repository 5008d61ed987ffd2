//! Template helpers: named units of logic that templates call by name.
//!
//! A helper is either a *structured* helper (a type implementing [`Helper`],
//! which declares whether its output is trusted markup) or a *plain*
//! callable (any closure over the argument list, never trusted).
//!
//! # Call Protocol
//!
//! ```text
//! template:  {{ helpers.url("posts", "show") }}
//!   → HelperTable::call_method("url", args)
//!   → invoke(registry, ctx, "url", args)
//!   → HelperOutput::Raw(value) | HelperOutput::Escaped(value)
//!   → engine inserts Raw as-is, escapes Escaped
//! ```
//!
//! The escaping decision travels as a [`HelperOutput`] tag all the way to the
//! insertion point. Raw and escaped results never share a plain string type.
//!
//! # Lookup Misses
//!
//! Calling a helper that is not registered yields an empty string instead of
//! an error, so templates can probe optional helpers. This also means a typo
//! in a helper name renders nothing. Misses are logged at `debug` level under
//! the `ferrule_render::helper` target; enable it when a helper seems to
//! vanish from the page.
//!
//! # Canonical Names
//!
//! Structured helpers declare an [`identity`](Helper::identity) in type-path
//! form (`"app::UrlFunction"`). [`canonical_name`] lower-cases it, strips a
//! trailing `function` and keeps the last path segment, yielding `url`.

mod invoke;
mod registry;
mod table;

pub use invoke::{invoke, HelperOutput};
pub use registry::HelperRegistry;
pub use table::HelperTable;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::ValueKind;
use minijinja::{Environment, Error, ErrorKind, Value};

use crate::template::{HELPERS_GLOBAL, TEMPLATE_EXTENSIONS};

/// Suffix stripped from helper identities when deriving canonical names.
pub const HELPER_SUFFIX: &str = "function";

/// A structured template helper.
///
/// # Example
///
/// ```rust
/// use ferrule_render::{Helper, HelperContext, HelperRegistry};
/// use minijinja::{Error, Value};
///
/// struct ShoutFunction;
///
/// impl Helper for ShoutFunction {
///     fn identity(&self) -> &'static str {
///         "app::helpers::ShoutFunction"
///     }
///
///     fn call(&self, _ctx: &HelperContext<'_>, args: &[Value]) -> Result<Value, Error> {
///         let text = args.first().map(|v| v.to_string()).unwrap_or_default();
///         Ok(Value::from(text.to_uppercase()))
///     }
/// }
///
/// let mut registry = HelperRegistry::new();
/// let name = registry.register(ShoutFunction).unwrap();
/// assert_eq!(name, "shout");
/// ```
pub trait Helper: Send + Sync {
    /// Declared identity of the helper, in type-path form.
    ///
    /// Used to derive the canonical name when the helper is registered
    /// without an explicit one.
    fn identity(&self) -> &'static str;

    /// Whether the result is trusted markup that must not be escaped.
    fn raw_output(&self) -> bool {
        false
    }

    /// Runs the helper with the template's argument list.
    fn call(&self, ctx: &HelperContext<'_>, args: &[Value]) -> Result<Value, Error>;
}

/// Signature of a plain callable helper.
pub type HelperFn = Arc<dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync>;

/// A registered helper.
#[derive(Clone)]
pub enum HelperUnit {
    /// A [`Helper`] implementation carrying its own raw/escaped preference.
    Structured(Arc<dyn Helper>),
    /// A plain callable. Its output is always escaped.
    Plain(HelperFn),
}

impl HelperUnit {
    /// Wraps a structured helper.
    pub fn structured<H>(helper: H) -> Self
    where
        H: Helper + 'static,
    {
        HelperUnit::Structured(Arc::new(helper))
    }

    /// Wraps a plain callable.
    pub fn plain<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        HelperUnit::Plain(Arc::new(func))
    }

    /// Returns true if this unit's output bypasses escaping.
    pub fn is_raw(&self) -> bool {
        match self {
            HelperUnit::Structured(helper) => helper.raw_output(),
            HelperUnit::Plain(_) => false,
        }
    }
}

impl fmt::Debug for HelperUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelperUnit::Structured(helper) => f
                .debug_struct("Structured")
                .field("identity", &helper.identity())
                .field("raw_output", &helper.raw_output())
                .finish(),
            HelperUnit::Plain(_) => f.write_str("Plain(..)"),
        }
    }
}

/// Derives the canonical registry name from a helper identity.
///
/// ```rust
/// use ferrule_render::canonical_name;
///
/// assert_eq!(canonical_name("app::helpers::UrlFunction"), "url");
/// assert_eq!(canonical_name("Namespace\\BarFunction"), "bar");
/// assert_eq!(canonical_name("Markdown"), "markdown");
/// ```
pub fn canonical_name(identity: &str) -> String {
    let lowered = identity.to_lowercase();
    let name = lowered.strip_suffix(HELPER_SUFFIX).unwrap_or(&lowered);
    match name.rfind([':', '\\']) {
        Some(pos) => name[pos + 1..].to_string(),
        None => name.to_string(),
    }
}

/// Renders named partial templates on behalf of a helper.
pub trait Partials {
    /// Renders `name` with `variables`, or returns `None` if no template
    /// by that name exists.
    fn render_partial(&self, name: &str, variables: &Value) -> Result<Option<String>, Error>;
}

impl Partials for Environment<'_> {
    fn render_partial(&self, name: &str, variables: &Value) -> Result<Option<String>, Error> {
        let candidates = std::iter::once(name.to_string())
            .chain(TEMPLATE_EXTENSIONS.iter().map(|ext| format!("{}{}", name, ext)));

        for candidate in candidates {
            match self.get_template(&candidate) {
                Ok(tmpl) => return tmpl.render(variables).map(Some),
                Err(err) if err.kind() == ErrorKind::TemplateNotFound => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }
}

/// What a helper can see of the template that invoked it.
#[derive(Clone, Copy)]
pub struct HelperContext<'a> {
    template: Option<&'a str>,
    variables: &'a Value,
    helpers: Option<&'a Value>,
    partials: Option<&'a dyn Partials>,
}

impl<'a> HelperContext<'a> {
    /// Creates a context outside of any template render.
    pub fn new(variables: &'a Value) -> Self {
        Self {
            template: None,
            variables,
            helpers: None,
            partials: None,
        }
    }

    /// Sets the name of the template being rendered.
    pub fn with_template(mut self, name: &'a str) -> Self {
        self.template = Some(name);
        self
    }

    /// Sets the helper table of the invoking template.
    pub fn with_helpers(mut self, helpers: &'a Value) -> Self {
        self.helpers = Some(helpers);
        self
    }

    /// Gives the helper access to partial templates.
    pub fn with_partials(mut self, partials: &'a dyn Partials) -> Self {
        self.partials = Some(partials);
        self
    }

    /// Name of the invoking template, if any.
    pub fn template_name(&self) -> Option<&'a str> {
        self.template
    }

    /// The full variables mapping passed to the template.
    pub fn variables(&self) -> &'a Value {
        self.variables
    }

    /// Looks up one template variable.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.variables
            .get_attr(name)
            .ok()
            .filter(|value| !value.is_undefined())
    }

    /// Partial renderer, available while a template is rendering.
    pub fn partials(&self) -> Option<&'a dyn Partials> {
        self.partials
    }

    /// Context for rendering a nested template: the variables plus, when
    /// known, the helper table under [`HELPERS_GLOBAL`].
    pub fn render_scope(&self) -> Value {
        let Some(helpers) = self.helpers else {
            return self.variables.clone();
        };

        let mut scope = BTreeMap::new();
        if self.variables.kind() == ValueKind::Map {
            if let Ok(keys) = self.variables.try_iter() {
                for key in keys {
                    if let Ok(value) = self.variables.get_item(&key) {
                        scope.insert(key.to_string(), value);
                    }
                }
            }
        }
        scope.insert(HELPERS_GLOBAL.to_string(), helpers.clone());
        Value::from(scope)
    }
}

impl fmt::Debug for HelperContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperContext")
            .field("template", &self.template)
            .field("helpers", &self.helpers.is_some())
            .field("partials", &self.partials.is_some())
            .finish()
    }
}
