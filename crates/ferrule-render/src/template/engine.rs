//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait, which lets the response
//! layer render templates without knowing the backend. The default
//! implementation is [`MiniJinjaEngine`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, Value};
use tracing::{debug, warn};

use crate::error::RenderError;
use crate::helper::{HelperRegistry, HelperTable};

/// Name under which the helper table is visible to templates.
pub const HELPERS_GLOBAL: &str = "helpers";

/// A template engine that renders templates with data and helpers.
pub trait TemplateEngine: Send + Sync {
    /// Renders the template file at `path`.
    ///
    /// `data` is the variables mapping. `helpers` is made available to the
    /// template as the [`HELPERS_GLOBAL`] object.
    fn render_file(
        &self,
        path: &Path,
        data: &serde_json::Value,
        helpers: &HelperRegistry,
    ) -> Result<String, RenderError>;

    /// Renders a template given as a string.
    fn render_template(
        &self,
        source: &str,
        data: &serde_json::Value,
        helpers: &HelperRegistry,
    ) -> Result<String, RenderError>;
}

/// MiniJinja-based template engine.
///
/// Every template is HTML auto-escaped. When created with a root directory,
/// templates can `{% include %}` or `{% extends %}` other files under it,
/// and the `using` style of helper can render partials from it.
///
/// # Example
///
/// ```rust
/// use ferrule_render::{HelperRegistry, MiniJinjaEngine, TemplateEngine};
/// use serde_json::json;
///
/// let mut helpers = HelperRegistry::new();
/// helpers
///     .register_fn("shout", |args| {
///         Ok(args.first().map(|v| v.to_string().to_uppercase()).unwrap_or_default().into())
///     })
///     .unwrap();
///
/// let engine = MiniJinjaEngine::new();
/// let output = engine
///     .render_template("{{ helpers.shout(name) }}", &json!({"name": "<ok>"}), &helpers)
///     .unwrap();
/// assert_eq!(output, "&lt;OK&gt;");
/// ```
pub struct MiniJinjaEngine {
    env: Environment<'static>,
    root: Option<PathBuf>,
}

impl MiniJinjaEngine {
    /// Creates an engine without a template directory.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_name| AutoEscape::Html);
        Self { env, root: None }
    }

    /// Creates an engine that loads includes and partials from `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut engine = Self::new();
        engine.env.set_loader(minijinja::path_loader(&root));
        engine.root = Some(root);
        engine
    }

    /// Returns a reference to the underlying MiniJinja environment.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Returns a mutable reference to the underlying MiniJinja environment.
    ///
    /// This allows registering filters or tests directly.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Name the loader would use for `path`: relative to the root with `/`
    /// separators, or the full path for files outside it.
    fn template_name(&self, path: &Path) -> String {
        let relative = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render_file(
        &self,
        path: &Path,
        data: &serde_json::Value,
        helpers: &HelperRegistry,
    ) -> Result<String, RenderError> {
        let name = self.template_name(path);
        let source = fs::read_to_string(path).map_err(|err| RenderError::read(path, err))?;
        debug!(template = %name, helpers = helpers.len(), "rendering template file");
        Ok(self
            .env
            .render_named_str(&name, &source, build_context(data, helpers))?)
    }

    fn render_template(
        &self,
        source: &str,
        data: &serde_json::Value,
        helpers: &HelperRegistry,
    ) -> Result<String, RenderError> {
        Ok(self.env.render_str(source, build_context(data, helpers))?)
    }
}

/// Merges the variables with the helper table.
///
/// The helper table always wins over a variable of the same name.
fn build_context(data: &serde_json::Value, helpers: &HelperRegistry) -> BTreeMap<String, Value> {
    let variables = Value::from_serialize(data);
    let mut context = BTreeMap::new();

    match data {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                context.insert(key.clone(), Value::from_serialize(value));
            }
        }
        serde_json::Value::Null => {}
        other => warn!(kind = ?other, "template variables are not a mapping; ignoring them"),
    }

    if context.contains_key(HELPERS_GLOBAL) {
        warn!(
            variable = HELPERS_GLOBAL,
            "variable is shadowed by the helper table"
        );
    }
    context.insert(
        HELPERS_GLOBAL.to_string(),
        Value::from_object(HelperTable::new(helpers.clone(), variables)),
    );
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::{Helper, HelperContext};
    use minijinja::Error;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    struct EmphasisFunction {
        raw: bool,
    }

    impl Helper for EmphasisFunction {
        fn identity(&self) -> &'static str {
            "EmphasisFunction"
        }

        fn raw_output(&self) -> bool {
            self.raw
        }

        fn call(&self, _ctx: &HelperContext<'_>, args: &[Value]) -> Result<Value, Error> {
            let text = args.first().map(|v| v.to_string()).unwrap_or_default();
            Ok(Value::from(format!("<em>{}</em>", text)))
        }
    }

    fn helpers(raw: bool) -> HelperRegistry {
        let mut registry = HelperRegistry::new();
        registry.register(EmphasisFunction { raw }).unwrap();
        registry
    }

    #[test]
    fn test_variables_are_escaped() {
        let engine = MiniJinjaEngine::new();
        let output = engine
            .render_template("{{ title }}", &json!({"title": "<b>"}), &HelperRegistry::new())
            .unwrap();
        assert_eq!(output, "&lt;b&gt;");
    }

    #[test]
    fn test_raw_helper_output_is_not_escaped() {
        let engine = MiniJinjaEngine::new();
        let output = engine
            .render_template("{{ helpers.emphasis('x') }}", &json!({}), &helpers(true))
            .unwrap();
        assert_eq!(output, "<em>x</em>");
    }

    #[test]
    fn test_escaped_helper_output_is_escaped() {
        let engine = MiniJinjaEngine::new();
        let output = engine
            .render_template("{{ helpers.emphasis('x') }}", &json!({}), &helpers(false))
            .unwrap();
        // MiniJinja also escapes `/`.
        assert_eq!(output, "&lt;em&gt;x&lt;&#x2f;em&gt;");
    }

    #[test]
    fn test_missing_helper_renders_empty() {
        let engine = MiniJinjaEngine::new();
        let output = engine
            .render_template("[{{ helpers.nope(1, 2) }}]", &json!({}), &HelperRegistry::new())
            .unwrap();
        assert_eq!(output, "[]");
    }

    #[test]
    fn test_helper_table_shadows_variable() {
        let engine = MiniJinjaEngine::new();
        let output = engine
            .render_template(
                "{{ helpers.emphasis('y') }}",
                &json!({"helpers": "oops"}),
                &helpers(true),
            )
            .unwrap();
        assert_eq!(output, "<em>y</em>");
    }

    #[test]
    fn test_render_file_with_include() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("layout")).unwrap();
        fs::write(dir.path().join("layout/header.html"), "<h1>{{ title }}</h1>").unwrap();
        fs::write(
            dir.path().join("page.html"),
            "{% include 'layout/header.html' %}<p>{{ body }}</p>",
        )
        .unwrap();

        let engine = MiniJinjaEngine::with_root(dir.path());
        let output = engine
            .render_file(
                &dir.path().join("page.html"),
                &json!({"title": "Hi", "body": "a & b"}),
                &HelperRegistry::new(),
            )
            .unwrap();
        assert_eq!(output, "<h1>Hi</h1><p>a &amp; b</p>");
    }

    #[test]
    fn test_render_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let engine = MiniJinjaEngine::with_root(dir.path());
        let err = engine
            .render_file(&dir.path().join("nope.html"), &json!({}), &HelperRegistry::new())
            .unwrap_err();
        assert!(matches!(err, RenderError::Read { ref path, .. } if path.ends_with("nope.html")));
    }

    #[test]
    fn test_template_name_is_relative_to_root() {
        let engine = MiniJinjaEngine::with_root("/srv/templates");
        assert_eq!(
            engine.template_name(Path::new("/srv/templates/posts/show.html")),
            "posts/show.html"
        );
    }
}
