//! Request identifiers used to derive the default template.

/// The routed controller and action of the current request.
pub trait RequestContext {
    fn controller(&self) -> &str;
    fn action(&self) -> &str;
}

/// A plain controller/action pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub controller: String,
    pub action: String,
}

impl Route {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }
}

impl Default for Route {
    fn default() -> Self {
        Self::new("index", "index")
    }
}

impl RequestContext for Route {
    fn controller(&self) -> &str {
        &self.controller
    }

    fn action(&self) -> &str {
        &self.action
    }
}

/// Separator between controller and action in a derived template name.
pub const TEMPLATE_SEPARATOR: char = '/';

/// Default template name for a request: `controller/action`, lower-cased.
pub fn default_template_name(request: &dyn RequestContext) -> String {
    format!(
        "{}{}{}",
        request.controller().to_lowercase(),
        TEMPLATE_SEPARATOR,
        request.action().to_lowercase()
    )
}
