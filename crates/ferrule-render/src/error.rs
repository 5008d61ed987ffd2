//! Errors raised while rendering templates and registering helpers.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// A template could not be rendered.
#[derive(Debug)]
pub enum RenderError {
    /// The resolved template file could not be read.
    Read { path: PathBuf, source: io::Error },

    /// MiniJinja rejected the template or failed while evaluating it.
    ///
    /// Failures of helpers called from inside a template land here too,
    /// carrying the template name and line.
    Template(minijinja::Error),

    /// A helper called directly, outside any template, returned an error.
    Helper {
        name: String,
        source: minijinja::Error,
    },
}

impl RenderError {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RenderError::Read {
            path: path.into(),
            source,
        }
    }

    pub fn helper(name: impl Into<String>, source: minijinja::Error) -> Self {
        RenderError::Helper {
            name: name.into(),
            source,
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Read { path, source } => {
                write!(f, "cannot read template {}: {}", path.display(), source)
            }
            RenderError::Template(err) => write!(f, "{}", err),
            RenderError::Helper { name, source } => {
                write!(f, "helper '{}' failed: {}", name, source)
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Read { source, .. } => Some(source),
            RenderError::Template(err) => Some(err),
            RenderError::Helper { source, .. } => Some(source),
        }
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        RenderError::Template(err)
    }
}

/// A helper registration was rejected.
///
/// Raised by the registering call itself, never on first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The helper's name cannot be looked up from a template.
    InvalidHelper {
        /// The name (or identity) that was given at registration.
        name: String,
        /// Why the registration was rejected.
        reason: String,
    },
}

impl RegistryError {
    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        RegistryError::InvalidHelper {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidHelper { name, reason } => {
                write!(f, "invalid helper '{}': {}", name, reason)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
