//! Exposes a [`HelperRegistry`] to templates as a MiniJinja object.

use std::sync::Arc;

use minijinja::value::{Enumerator, Object};
use minijinja::{Error, State, Value};

use super::{invoke, HelperContext, HelperOutput, HelperRegistry};

/// The `helpers` object seen by templates.
///
/// Every method call on it is routed through [`invoke`]:
///
/// ```jinja
/// <a href="{{ helpers.url('posts', 'show', {'id': post.id}) }}">{{ post.title }}</a>
/// {{ helpers.using('partials/sidebar') }}
/// ```
#[derive(Debug)]
pub struct HelperTable {
    registry: HelperRegistry,
    variables: Value,
}

impl HelperTable {
    /// Creates a table over a snapshot of `registry`.
    pub fn new(registry: HelperRegistry, variables: Value) -> Self {
        Self {
            registry,
            variables,
        }
    }

    pub fn registry(&self) -> &HelperRegistry {
        &self.registry
    }
}

impl Object for HelperTable {
    fn enumerate(self: &Arc<Self>) -> Enumerator {
        let names: Vec<Value> = self
            .registry
            .names()
            .into_iter()
            .map(Value::from)
            .collect();
        Enumerator::Values(names)
    }

    fn call_method(
        self: &Arc<Self>,
        state: &State,
        name: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        let table = Value::from_dyn_object(Arc::clone(self));
        let ctx = HelperContext::new(&self.variables)
            .with_template(state.name())
            .with_helpers(&table)
            .with_partials(state.env());
        invoke(&self.registry, &ctx, name, args).map(HelperOutput::into_template_value)
    }
}
