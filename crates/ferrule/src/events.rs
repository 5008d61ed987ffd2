//! Event notification around emission.
//!
//! The composer fires [`OUTPUT_EVENT`] exactly once, at the start of
//! [`ResponseComposer::output`](crate::ResponseComposer::output), before any
//! buffered header or body is sent. Listeners receive the composer itself
//! and may inspect or change pending headers, body and variables one last
//! time, or abort emission by returning an error.
//!
//! ```text
//! output()
//!   → trigger("output", &mut composer)  ← listeners run here
//!   → flush headers
//!   → flush body
//!   → render template
//! ```

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::composer::ResponseComposer;

/// Event fired before emission.
pub const OUTPUT_EVENT: &str = "output";

/// Error returned by a listener.
#[derive(Debug, Error)]
#[error("event listener failed: {message}")]
pub struct ListenerError {
    /// Human-readable error message
    pub message: String,
    /// The underlying error source, if any
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Sets the source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        self.source = Some(source.into());
        self
    }
}

/// Process-side event hook.
pub trait EventNotifier {
    /// Notifies listeners of `event`, passing the composer as subject.
    fn trigger(&self, event: &str, subject: &mut ResponseComposer) -> Result<(), ListenerError>;
}

/// Type alias for listener functions.
pub type ListenerFn = Rc<dyn Fn(&mut ResponseComposer) -> Result<(), ListenerError>>;

/// Listeners keyed by event name, run in registration order.
#[derive(Clone, Default)]
pub struct Events {
    listeners: Vec<(String, ListenerFn)>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener for `event`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ferrule::{Events, OUTPUT_EVENT};
    ///
    /// let events = Events::new().on(OUTPUT_EVENT, |composer| {
    ///     composer.set("rendered_at", "2024-01-01T00:00:00Z");
    ///     Ok(())
    /// });
    /// assert_eq!(events.len(), 1);
    /// ```
    pub fn on<F>(mut self, event: impl Into<String>, listener: F) -> Self
    where
        F: Fn(&mut ResponseComposer) -> Result<(), ListenerError> + 'static,
    {
        self.listeners.push((event.into(), Rc::new(listener)));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl EventNotifier for Events {
    fn trigger(&self, event: &str, subject: &mut ResponseComposer) -> Result<(), ListenerError> {
        for (name, listener) in &self.listeners {
            if name == event {
                listener(subject)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.listeners.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("Events").field("listeners", &names).finish()
    }
}
