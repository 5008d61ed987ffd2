//! # Ferrule Render - Templates and Helpers for Ferrule Responses
//!
//! `ferrule-render` is the rendering half of `ferrule`: it resolves template
//! names to files, renders them with MiniJinja, and lets templates call
//! named *helpers* under a strict escaping contract.
//!
//! ## Core Concepts
//!
//! - [`Helper`]: A structured helper that declares whether its output is
//!   trusted markup ([`Helper::raw_output`])
//! - [`HelperUnit`]: Either a structured helper or a plain callable (always escaped)
//! - [`HelperRegistry`]: Helpers keyed by lower-case canonical name
//! - [`invoke`]: The call protocol; returns a [`HelperOutput`] tagged `Raw` or `Escaped`
//! - [`TemplateResolver`] / [`DirectoryResolver`]: Template name to file path
//! - [`TemplateEngine`] / [`MiniJinjaEngine`]: Rendering with auto-escaping
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrule_render::{Helper, HelperContext, HelperRegistry, MiniJinjaEngine, TemplateEngine};
//! use minijinja::{Error, Value};
//! use serde_json::json;
//!
//! struct BadgeFunction;
//!
//! impl Helper for BadgeFunction {
//!     fn identity(&self) -> &'static str {
//!         "app::BadgeFunction"
//!     }
//!
//!     fn raw_output(&self) -> bool {
//!         true
//!     }
//!
//!     fn call(&self, _ctx: &HelperContext<'_>, args: &[Value]) -> Result<Value, Error> {
//!         let count = args.first().and_then(|v| v.as_i64()).unwrap_or(0);
//!         Ok(Value::from(format!("<span class=\"badge\">{}</span>", count)))
//!     }
//! }
//!
//! let mut helpers = HelperRegistry::new();
//! helpers.register(BadgeFunction).unwrap();
//!
//! let engine = MiniJinjaEngine::new();
//! let html = engine
//!     .render_template("{{ helpers.badge(unread) }}", &json!({"unread": 3}), &helpers)
//!     .unwrap();
//! assert_eq!(html, "<span class=\"badge\">3</span>");
//! ```
//!
//! ## Escaping Contract
//!
//! Results of structured helpers with `raw_output() == true` are inserted
//! as-is. Everything else, including every plain callable, is escaped at
//! insertion. Calling an unregistered helper renders an empty string.

mod error;
pub mod helper;
pub mod template;

pub use error::{RegistryError, RenderError};
pub use helper::{
    canonical_name, invoke, Helper, HelperContext, HelperFn, HelperOutput, HelperRegistry,
    HelperTable, HelperUnit, Partials, HELPER_SUFFIX,
};
pub use template::{
    DirectoryResolver, MiniJinjaEngine, TemplateEngine, TemplateResolver, HELPERS_GLOBAL,
    TEMPLATE_EXTENSIONS,
};
