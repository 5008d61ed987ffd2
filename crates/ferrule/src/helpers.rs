//! Built-in template helpers.
//!
//! Every composer starts with these three unless it is built from
//! [`ComposerConfig::empty`](crate::ComposerConfig::empty):
//!
//! | Name | Output | Call |
//! |------|--------|------|
//! | `url` | escaped | `helpers.url('posts', 'show', {'id': 3})` → `/posts/show?id=3` |
//! | `config` | escaped | `helpers.config('site.title', 'Untitled')` |
//! | `using` | raw | `helpers.using('partials/sidebar', user)` |

use std::sync::Arc;

use ferrule_render::{Helper, HelperContext};
use minijinja::value::ValueKind;
use minijinja::{Error, ErrorKind, Value};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

use crate::settings::Settings;

/// Setting holding the URL prefix used by the `url` helper.
pub const URL_BASE_KEY: &str = "url.base";

/// Everything but RFC 3986 unreserved characters is encoded.
const URL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The three built-in helpers, in registration order.
pub fn default_helpers(settings: Arc<dyn Settings>) -> Vec<Arc<dyn Helper>> {
    vec![
        Arc::new(UrlHelper::new(Arc::clone(&settings))),
        Arc::new(ConfigHelper::new(settings)),
        Arc::new(UsingHelper),
    ]
}

/// Builds application URLs from path segments and query parameters.
///
/// String and number arguments become path segments under the `url.base`
/// setting (default `/`). A trailing map argument becomes the query string.
/// Segments and query pairs are percent-encoded.
pub struct UrlHelper {
    settings: Arc<dyn Settings>,
}

impl UrlHelper {
    pub fn new(settings: Arc<dyn Settings>) -> Self {
        Self { settings }
    }

    fn base(&self) -> String {
        self.settings
            .get(URL_BASE_KEY)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "/".to_string())
    }
}

impl Helper for UrlHelper {
    fn identity(&self) -> &'static str {
        "ferrule::helpers::UrlFunction"
    }

    fn call(&self, _ctx: &HelperContext<'_>, args: &[Value]) -> Result<Value, Error> {
        let mut segments = Vec::new();
        let mut query = Vec::new();

        for arg in args {
            match arg.kind() {
                ValueKind::Map => {
                    for key in arg.try_iter()? {
                        let value = arg.get_item(&key)?;
                        if value.is_none() || value.is_undefined() {
                            continue;
                        }
                        query.push(format!(
                            "{}={}",
                            utf8_percent_encode(&key.to_string(), URL_ENCODE_SET),
                            utf8_percent_encode(&value.to_string(), URL_ENCODE_SET)
                        ));
                    }
                }
                ValueKind::None | ValueKind::Undefined => {}
                ValueKind::String | ValueKind::Number => {
                    let segment = arg.to_string();
                    let segment = segment.trim_matches('/');
                    if !segment.is_empty() {
                        segments.push(
                            segment
                                .split('/')
                                .map(|part| utf8_percent_encode(part, URL_ENCODE_SET).to_string())
                                .collect::<Vec<_>>()
                                .join("/"),
                        );
                    }
                }
                other => {
                    return Err(Error::new(
                        ErrorKind::InvalidOperation,
                        format!("url() cannot use a {} as a path segment", other),
                    ))
                }
            }
        }

        let mut url = self.base().trim_end_matches('/').to_string();
        url.push('/');
        url.push_str(&segments.join("/"));
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        Ok(Value::from(url))
    }
}

/// Reads a value from the settings store: `config(key, default?)`.
pub struct ConfigHelper {
    settings: Arc<dyn Settings>,
}

impl ConfigHelper {
    pub fn new(settings: Arc<dyn Settings>) -> Self {
        Self { settings }
    }
}

impl Helper for ConfigHelper {
    fn identity(&self) -> &'static str {
        "ferrule::helpers::ConfigFunction"
    }

    fn call(&self, _ctx: &HelperContext<'_>, args: &[Value]) -> Result<Value, Error> {
        let key = args.first().and_then(Value::as_str).ok_or_else(|| {
            Error::new(
                ErrorKind::MissingArgument,
                "config() requires a setting key",
            )
        })?;

        match self.settings.get(key) {
            Some(value) => Ok(Value::from_serialize(&value)),
            None => Ok(args.get(1).cloned().unwrap_or_else(|| Value::from(""))),
        }
    }
}

/// Renders a partial template when a condition holds:
/// `using(template, condition?)`.
///
/// The partial sees the same variables as the calling template. Renders
/// nothing when the condition is falsy or the partial does not exist.
pub struct UsingHelper;

impl Helper for UsingHelper {
    fn identity(&self) -> &'static str {
        "ferrule::helpers::UsingFunction"
    }

    fn raw_output(&self) -> bool {
        true
    }

    fn call(&self, ctx: &HelperContext<'_>, args: &[Value]) -> Result<Value, Error> {
        let name = args.first().and_then(Value::as_str).ok_or_else(|| {
            Error::new(
                ErrorKind::MissingArgument,
                "using() requires a template name",
            )
        })?;

        if !args.get(1).map_or(true, Value::is_true) {
            return Ok(Value::from(""));
        }

        let Some(partials) = ctx.partials() else {
            debug!(partial = name, "using() called outside a template render");
            return Ok(Value::from(""));
        };

        match partials.render_partial(name, &ctx.render_scope())? {
            Some(html) => Ok(Value::from(html)),
            None => {
                debug!(partial = name, "partial not found, rendering nothing");
                Ok(Value::from(""))
            }
        }
    }
}
