//! The per-request response façade.
//!
//! A [`ResponseComposer`] collects three things while a request is handled:
//! header lines, printed body text, and template variables. A single call to
//! [`output`](ResponseComposer::output) then emits them in a fixed order:
//!
//! 1. the `"output"` event fires, with the composer as subject
//! 2. buffered headers are sent, in insertion order
//! 3. buffered body text is sent
//! 4. unless suppressed, the template is resolved, rendered with the
//!    variables and helpers, and sent
//!
//! Whether headers and body are buffered at all is decided once, at
//! construction, by [`ComposerConfig::deferred`]. In immediate mode every
//! header and write reaches the transport at once and steps 2 and 3 have
//! nothing to do.
//!
//! # Template Selection
//!
//! An explicit [`set_template`](ResponseComposer::set_template) always wins.
//! Otherwise the template name is derived at emission time as
//! `controller/action`, lower-cased. Both paths resolve through the same
//! [`TemplateResolver`] and fail with the same
//! [`ResponseError::TemplateNotFound`].

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use ferrule_render::{
    invoke, Helper, HelperContext, HelperOutput, HelperRegistry, HelperUnit, RenderError,
    TemplateEngine, TemplateResolver,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::buffer::OutputBuffer;
use crate::builder::ComposerBuilder;
use crate::error::ResponseError;
use crate::events::{EventNotifier, OUTPUT_EVENT};
use crate::format::format_printf;
use crate::request::{default_template_name, RequestContext};
use crate::settings::{ComposerConfig, Settings};
use crate::transport::Transport;
use crate::translate::Translator;

/// Composes one HTTP response from headers, printed output and a template.
///
/// # Example
///
/// ```rust
/// use ferrule::{ComposerConfig, MemoryTransport, ResponseComposer};
/// use serde_json::json;
///
/// let transport = MemoryTransport::new();
/// let mut response = ResponseComposer::builder(transport.clone())
///     .config(ComposerConfig::new().deferred(true))
///     .build()
///     .unwrap();
///
/// response.write_json(&json!({"ok": true})).unwrap();
/// assert!(transport.events().is_empty());
///
/// response.output().unwrap();
/// assert_eq!(transport.headers(), vec!["Content-Type: application/json"]);
/// assert_eq!(transport.body(), r#"{"ok":true}"#);
/// ```
pub struct ResponseComposer {
    pub(crate) buffer: OutputBuffer,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) template_suppressed: bool,
    pub(crate) template: Option<PathBuf>,
    pub(crate) variables: Map<String, Value>,
    pub(crate) helpers: HelperRegistry,
    pub(crate) resolver: Arc<dyn TemplateResolver>,
    pub(crate) engine: Arc<dyn TemplateEngine>,
    pub(crate) request: Rc<dyn RequestContext>,
    pub(crate) events: Rc<dyn EventNotifier>,
    pub(crate) translator: Rc<dyn Translator>,
    pub(crate) emitted: bool,
}

impl ResponseComposer {
    /// Starts building a composer that emits to `transport`.
    pub fn builder(transport: impl Transport + 'static) -> ComposerBuilder {
        ComposerBuilder::new(transport)
    }

    /// Starts building a composer whose output mode and built-in helpers
    /// read from `settings`.
    pub fn with_settings(
        transport: impl Transport + 'static,
        settings: Arc<dyn Settings>,
    ) -> ComposerBuilder {
        ComposerBuilder::new(transport).config(ComposerConfig::from_settings(settings))
    }

    // ------------------------------------------------------------------
    // Headers and body
    // ------------------------------------------------------------------

    /// Sets a header.
    ///
    /// With a value the line is `"name: value"`; without one `name` is used
    /// as the full line (e.g. a status line). Fails if the transport has
    /// already started sending; nothing is buffered or sent in that case.
    /// Repeated names are not deduplicated.
    pub fn set_header<'v>(
        &mut self,
        name: &str,
        value: impl Into<Option<&'v str>>,
    ) -> Result<(), ResponseError> {
        let line = match value.into() {
            Some(value) => format!("{}: {}", name, value),
            None => name.to_string(),
        };

        if self.transport.headers_sent() {
            return Err(ResponseError::AlreadyEmitted { header: line });
        }
        self.buffer.header(line, self.transport.as_mut())?;
        Ok(())
    }

    /// Writes body text.
    pub fn write(&mut self, text: impl AsRef<str>) -> Result<(), ResponseError> {
        self.buffer.write(text.as_ref(), self.transport.as_mut())?;
        Ok(())
    }

    /// Writes body text produced by a printf-style format string.
    ///
    /// With no arguments `format` is written verbatim, `%` included. See
    /// [`format_printf`](crate::format_printf) for the supported syntax.
    pub fn write_formatted(&mut self, format: &str, args: &[Value]) -> Result<(), ResponseError> {
        if args.is_empty() {
            return self.write(format);
        }
        let text = format_printf(format, args)?;
        self.write(text)
    }

    /// Translates `key` and passes the translation to
    /// [`write_formatted`](Self::write_formatted) as the format string.
    pub fn write_translated(&mut self, key: &str, args: &[Value]) -> Result<(), ResponseError> {
        let format = self.translator.translate(key);
        self.write_formatted(&format, args)
    }

    /// Writes `data` as a JSON response.
    ///
    /// Suppresses the template, sets `Content-Type: application/json` and
    /// writes the serialized value through the same header and body policy
    /// as [`set_header`](Self::set_header) and [`write`](Self::write).
    pub fn write_json<T>(&mut self, data: &T) -> Result<(), ResponseError>
    where
        T: Serialize + ?Sized,
    {
        self.suppress_template();
        self.set_header("Content-Type", "application/json")?;
        let body = serde_json::to_string(data)?;
        self.write(body)
    }

    // ------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------

    /// Selects the template to render, overriding the derived default.
    ///
    /// The name is lower-cased before resolution. Once the template is
    /// suppressed this does nothing.
    pub fn set_template(&mut self, name: &str) -> Result<(), ResponseError> {
        if self.template_suppressed {
            debug!(template = name, "template suppressed; not resolving");
            return Ok(());
        }
        let name = name.to_lowercase();
        let path = self.resolve_template(&name)?;
        self.template = Some(path);
        Ok(())
    }

    /// Prevents any template from being resolved or rendered. Permanent.
    pub fn suppress_template(&mut self) {
        if !self.template_suppressed {
            debug!("template suppressed");
        }
        self.template_suppressed = true;
    }

    pub fn is_template_suppressed(&self) -> bool {
        self.template_suppressed
    }

    /// The explicitly selected template path, if any.
    pub fn template_path(&self) -> Option<&Path> {
        self.template.as_deref()
    }

    fn resolve_template(&self, name: &str) -> Result<PathBuf, ResponseError> {
        match self.resolver.resolve(name) {
            Some(path) => {
                debug!(template = name, path = %path.display(), "template selected");
                Ok(path)
            }
            None => Err(ResponseError::template_not_found(name)),
        }
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    /// Sets a template variable. The last write wins.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Serializes `value` and sets it as a template variable.
    pub fn set_serialized<T>(&mut self, name: impl Into<String>, value: &T) -> Result<(), ResponseError>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        self.set(name, value);
        Ok(())
    }

    /// Returns a template variable.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Returns a template variable, or `default` if it is not set.
    pub fn get_or(&self, name: &str, default: Value) -> Value {
        self.get(name).cloned().unwrap_or(default)
    }

    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Registers a structured helper under its derived name.
    pub fn register<H>(&mut self, helper: H) -> Result<String, ResponseError>
    where
        H: Helper + 'static,
    {
        Ok(self.helpers.register(helper)?)
    }

    /// Registers a helper under an explicit name.
    pub fn register_as(&mut self, name: &str, unit: HelperUnit) -> Result<String, ResponseError> {
        Ok(self.helpers.register_as(name, unit)?)
    }

    /// Registers a plain callable helper. Its output is always escaped.
    pub fn register_fn<F>(&mut self, name: &str, func: F) -> Result<String, ResponseError>
    where
        F: Fn(&[minijinja::Value]) -> Result<minijinja::Value, minijinja::Error>
            + Send
            + Sync
            + 'static,
    {
        Ok(self.helpers.register_fn(name, func)?)
    }

    /// Calls a helper outside of a template, with the current variables as
    /// context. Unknown names yield an empty result, as in templates.
    pub fn call_helper(
        &self,
        name: &str,
        args: &[minijinja::Value],
    ) -> Result<HelperOutput, ResponseError> {
        let variables = minijinja::Value::from_serialize(&self.variables);
        let ctx = HelperContext::new(&variables);
        invoke(&self.helpers, &ctx, name, args)
            .map_err(|err| ResponseError::Render(RenderError::helper(name, err)))
    }

    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    pub fn helpers_mut(&mut self) -> &mut HelperRegistry {
        &mut self.helpers
    }

    // ------------------------------------------------------------------
    // Buffer inspection (for output listeners)
    // ------------------------------------------------------------------

    pub fn is_deferred(&self) -> bool {
        self.buffer.is_deferred()
    }

    /// Buffered header lines. Always empty in immediate mode.
    pub fn pending_headers(&self) -> &[String] {
        self.buffer
            .pending()
            .map(|p| p.headers.as_slice())
            .unwrap_or_default()
    }

    /// Buffered header lines, if deferred.
    pub fn pending_headers_mut(&mut self) -> Option<&mut Vec<String>> {
        self.buffer.pending_mut().map(|p| &mut p.headers)
    }

    /// Buffered body text. Always empty in immediate mode.
    pub fn pending_body(&self) -> &str {
        self.buffer
            .pending()
            .map(|p| p.body.as_str())
            .unwrap_or_default()
    }

    /// Buffered body text, if deferred.
    pub fn pending_body_mut(&mut self) -> Option<&mut String> {
        self.buffer.pending_mut().map(|p| &mut p.body)
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------

    /// Whether [`output`](Self::output) has run.
    pub fn has_emitted(&self) -> bool {
        self.emitted
    }

    /// Emits the response: event, headers, body, then the template.
    ///
    /// Runs at most once. Later calls do nothing, even if the first one
    /// failed part way: emission is never retried.
    pub fn output(&mut self) -> Result<(), ResponseError> {
        if self.emitted {
            debug!("output() called again after emission; ignoring");
            return Ok(());
        }
        self.emitted = true;

        let events = Rc::clone(&self.events);
        events.trigger(OUTPUT_EVENT, self)?;

        debug!(
            headers = self.pending_headers().len(),
            body_bytes = self.pending_body().len(),
            "flushing buffered output"
        );
        self.buffer.flush(self.transport.as_mut())?;

        if self.template_suppressed {
            return Ok(());
        }

        let path = match self.template.clone() {
            Some(path) => path,
            None => {
                let name = default_template_name(self.request.as_ref());
                self.resolve_template(&name)?
            }
        };

        let data = Value::Object(self.variables.clone());
        let html = self.engine.render_file(&path, &data, &self.helpers)?;
        if !html.is_empty() {
            self.transport.write(html.as_bytes())?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ResponseComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseComposer")
            .field("buffer", &self.buffer)
            .field("template_suppressed", &self.template_suppressed)
            .field("template", &self.template)
            .field("variables", &self.variables)
            .field("helpers", &self.helpers)
            .field("emitted", &self.emitted)
            .finish_non_exhaustive()
    }
}
