//! # Ferrule - Response Composition for Web Handlers
//!
//! Ferrule assembles one HTTP response per request from three sources:
//! header lines, printed body text, and a rendered template. Handlers write
//! into a [`ResponseComposer`]; a single call to
//! [`output`](ResponseComposer::output) emits everything in a fixed order.
//!
//! ## Core Concepts
//!
//! - [`ResponseComposer`]: The per-request façade
//! - [`ComposerConfig`]: Deferred vs immediate output, default helpers
//! - [`Transport`]: Where headers and bytes go ([`StreamTransport`], [`MemoryTransport`])
//! - [`Events`]: Listeners fired once, just before emission
//! - [`Translator`] / [`Catalog`]: Message lookup for
//!   [`write_translated`](ResponseComposer::write_translated)
//! - [`format_printf`]: printf-style formatting against JSON arguments
//!
//! Templates and helpers live in [`ferrule_render`], re-exported here as
//! [`render`].
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrule::{MemoryTransport, ResponseComposer, Route};
//! use std::fs;
//!
//! let dir = tempfile::tempdir().unwrap();
//! fs::create_dir(dir.path().join("posts")).unwrap();
//! fs::write(dir.path().join("posts/show.html"), "<h1>{{ title }}</h1>").unwrap();
//!
//! let transport = MemoryTransport::new();
//! let mut response = ResponseComposer::builder(transport.clone())
//!     .template_dir(dir.path())
//!     .request(Route::new("Posts", "Show"))
//!     .build()
//!     .unwrap();
//!
//! response.set_header("X-Request-Id", "42").unwrap();
//! response.set("title", "Fish & Chips");
//! response.output().unwrap();
//!
//! assert_eq!(transport.headers(), vec!["X-Request-Id: 42"]);
//! assert_eq!(transport.body(), "<h1>Fish &amp; Chips</h1>");
//! ```
//!
//! ## Output Modes
//!
//! In deferred mode (the default, setting `output.late`) headers and writes
//! are buffered until emission, and listeners may still change them. In
//! immediate mode they reach the transport at once. Either way, setting a
//! header after the transport has started sending fails with
//! [`ResponseError::AlreadyEmitted`].

mod buffer;
mod builder;
mod composer;
mod error;
mod events;
mod format;
pub mod helpers;
mod request;
mod settings;
mod translate;
mod transport;

pub use ferrule_render as render;

pub use buffer::{OutputBuffer, Pending};
pub use builder::{ComposerBuilder, DEFAULT_TEMPLATE_DIR};
pub use composer::ResponseComposer;
pub use error::ResponseError;
pub use events::{EventNotifier, Events, ListenerError, ListenerFn, OUTPUT_EVENT};
pub use format::{format_printf, FormatError};
pub use request::{default_template_name, RequestContext, Route, TEMPLATE_SEPARATOR};
pub use settings::{
    ComposerConfig, MapSettings, Settings, SettingsError, YamlSettings, DEFERRED_OUTPUT_DEFAULT,
    DEFERRED_OUTPUT_KEY,
};
pub use translate::{Catalog, IdentityTranslator, Translator};
pub use transport::{MemoryTransport, StreamTransport, Transport, TransportError, TransportEvent};

pub use ferrule_render::{Helper, HelperContext, HelperOutput, HelperRegistry, HelperUnit};
