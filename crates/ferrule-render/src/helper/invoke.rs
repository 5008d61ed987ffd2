//! Helper invocation and the escaping marker.

use minijinja::{Error, Value};
use tracing::debug;

use super::{HelperContext, HelperRegistry, HelperUnit};

/// Result of a helper call, tagged with its escaping requirement.
///
/// The tag is consumed once, at the point where the value is inserted into
/// markup: see [`into_template_value`](Self::into_template_value).
#[derive(Debug, Clone, PartialEq)]
pub enum HelperOutput {
    /// Trusted markup, inserted without escaping.
    Raw(Value),
    /// Untrusted value, escaped before insertion.
    Escaped(Value),
}

impl HelperOutput {
    /// Empty output, returned when a helper is not registered.
    pub fn empty() -> Self {
        HelperOutput::Raw(Value::from(""))
    }

    /// Returns true if the value must be escaped before insertion.
    pub fn requires_escaping(&self) -> bool {
        matches!(self, HelperOutput::Escaped(_))
    }

    /// The carried value, regardless of tag.
    pub fn value(&self) -> &Value {
        match self {
            HelperOutput::Raw(value) | HelperOutput::Escaped(value) => value,
        }
    }

    /// Converts into a value the template engine inserts correctly.
    ///
    /// Raw strings become safe strings so auto-escaping skips them.
    /// Escaped values lose any safe mark a helper may have put on them.
    pub fn into_template_value(self) -> Value {
        match self {
            HelperOutput::Raw(value) => match value.as_str() {
                Some(s) if !value.is_safe() => Value::from_safe_string(s.to_string()),
                _ => value,
            },
            HelperOutput::Escaped(value) => {
                if value.is_safe() {
                    Value::from(value.to_string())
                } else {
                    value
                }
            }
        }
    }
}

/// Calls the helper registered under `name` with the template's arguments.
///
/// A name that is not registered yields [`HelperOutput::empty`] rather than
/// an error. Structured helpers are tagged according to their
/// [`raw_output`](super::Helper::raw_output) flag; plain callables are always
/// tagged [`HelperOutput::Escaped`].
pub fn invoke(
    registry: &HelperRegistry,
    ctx: &HelperContext<'_>,
    name: &str,
    args: &[Value],
) -> Result<HelperOutput, Error> {
    let Some(unit) = registry.get(name) else {
        debug!(
            helper = name,
            template = ctx.template_name().unwrap_or("<none>"),
            "helper is not registered, rendering empty output"
        );
        return Ok(HelperOutput::empty());
    };

    match unit {
        HelperUnit::Structured(helper) => {
            let value = helper.call(ctx, args)?;
            if helper.raw_output() {
                Ok(HelperOutput::Raw(value))
            } else {
                Ok(HelperOutput::Escaped(value))
            }
        }
        HelperUnit::Plain(func) => Ok(HelperOutput::Escaped(func(args)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::Helper;

    struct BoldFunction {
        raw: bool,
    }

    impl Helper for BoldFunction {
        fn identity(&self) -> &'static str {
            "BoldFunction"
        }

        fn raw_output(&self) -> bool {
            self.raw
        }

        fn call(&self, _ctx: &HelperContext<'_>, args: &[Value]) -> Result<Value, Error> {
            let text = args.first().map(|v| v.to_string()).unwrap_or_default();
            Ok(Value::from(format!("<b>{}</b>", text)))
        }
    }

    fn registry_with_bold(raw: bool) -> HelperRegistry {
        let mut registry = HelperRegistry::new();
        registry.register(BoldFunction { raw }).unwrap();
        registry
    }

    #[test]
    fn test_missing_helper_is_empty_string() {
        let registry = HelperRegistry::new();
        let vars = Value::from(());
        let ctx = HelperContext::new(&vars);

        let out = invoke(&registry, &ctx, "missing", &[]).unwrap();
        assert_eq!(out.value().as_str(), Some(""));
        assert_eq!(out.into_template_value().to_string(), "");
    }

    #[test]
    fn test_raw_helper_passes_through() {
        let registry = registry_with_bold(true);
        let vars = Value::from(());
        let ctx = HelperContext::new(&vars);

        let out = invoke(&registry, &ctx, "bold", &[Value::from("x")]).unwrap();
        assert_eq!(out, HelperOutput::Raw(Value::from("<b>x</b>")));
        assert!(!out.requires_escaping());
        assert!(out.into_template_value().is_safe());
    }

    #[test]
    fn test_non_raw_helper_is_wrapped() {
        let registry = registry_with_bold(false);
        let vars = Value::from(());
        let ctx = HelperContext::new(&vars);

        let out = invoke(&registry, &ctx, "bold", &[Value::from("x")]).unwrap();
        assert_eq!(out, HelperOutput::Escaped(Value::from("<b>x</b>")));
        assert!(out.requires_escaping());
        assert!(!out.into_template_value().is_safe());
    }

    #[test]
    fn test_plain_callable_is_always_wrapped() {
        let mut registry = HelperRegistry::new();
        registry
            .register_fn("markup", |_| Ok(Value::from_safe_string("<i>".into())))
            .unwrap();
        let vars = Value::from(());
        let ctx = HelperContext::new(&vars);

        let out = invoke(&registry, &ctx, "markup", &[]).unwrap();
        assert!(out.requires_escaping());
        // A plain callable cannot smuggle markup through by marking it safe.
        let value = out.into_template_value();
        assert!(!value.is_safe());
        assert_eq!(value.as_str(), Some("<i>"));
    }

    #[test]
    fn test_plain_callable_receives_args() {
        let mut registry = HelperRegistry::new();
        registry
            .register_fn("count", |args| Ok(Value::from(args.len())))
            .unwrap();
        let vars = Value::from(());
        let ctx = HelperContext::new(&vars);

        let out = invoke(&registry, &ctx, "count", &[Value::from(1), Value::from(2)]).unwrap();
        assert_eq!(out.value(), &Value::from(2));
    }

    #[test]
    fn test_helper_error_propagates() {
        let mut registry = HelperRegistry::new();
        registry
            .register_fn("fail", |_| {
                Err(Error::new(
                    minijinja::ErrorKind::InvalidOperation,
                    "fail() always fails",
                ))
            })
            .unwrap();
        let vars = Value::from(());
        let ctx = HelperContext::new(&vars);

        assert!(invoke(&registry, &ctx, "fail", &[]).is_err());
    }
}
