//! Template resolution and rendering.
//!
//! Two small seams separate the response layer from the template backend:
//!
//! - [`TemplateResolver`] turns a template name (`"posts/show"`) into a
//!   readable file path, or reports that there is none.
//! - [`TemplateEngine`] renders a resolved file with the variables mapping
//!   and the helper table.
//!
//! [`DirectoryResolver`] and [`MiniJinjaEngine`] are the default
//! implementations and are meant to share the same root directory.

mod engine;
mod resolver;

pub use engine::{MiniJinjaEngine, TemplateEngine, HELPERS_GLOBAL};
pub use resolver::{DirectoryResolver, TemplateResolver, TEMPLATE_EXTENSIONS};
