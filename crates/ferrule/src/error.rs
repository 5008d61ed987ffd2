//! Error types for response composition.
//!
//! Every error here reports a programmer or configuration mistake. Nothing is
//! retried: the caller is expected to surface the error and abandon the
//! request.

use thiserror::Error;

use ferrule_render::{RegistryError, RenderError};

use crate::events::ListenerError;
use crate::format::FormatError;
use crate::transport::TransportError;

/// Errors raised by [`ResponseComposer`](crate::ResponseComposer).
#[derive(Debug, Error)]
pub enum ResponseError {
    /// A header was set after the transport began sending the response.
    #[error("cannot set header '{header}', headers already sent")]
    AlreadyEmitted {
        /// The full header line that was rejected.
        header: String,
    },

    /// The explicit or derived template does not exist or cannot be read.
    #[error("template '{name}' does not exist or cannot be read")]
    TemplateNotFound {
        /// The normalized template name that failed to resolve.
        name: String,
    },

    /// A helper registration was rejected.
    #[error(transparent)]
    InvalidHelper(#[from] RegistryError),

    /// The template engine failed while rendering.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The transport failed to send a header or body bytes.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// JSON serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A printf-style format string could not be applied.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// An event listener aborted emission.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

impl ResponseError {
    pub(crate) fn template_not_found(name: impl Into<String>) -> Self {
        ResponseError::TemplateNotFound { name: name.into() }
    }
}
