//! Builder for [`ResponseComposer`].
//!
//! Every collaborator has a default, so the shortest form is
//! `ResponseComposer::builder(transport).build()`:
//!
//! | Collaborator | Default |
//! |--------------|---------|
//! | config | deferred output, built-in `url`, `config` and `using` helpers |
//! | templates | [`DirectoryResolver`] over `templates/` |
//! | engine | [`MiniJinjaEngine`] rooted at `templates/` |
//! | request | [`Route::default`] (`index/index`) |
//! | events | no listeners |
//! | translator | [`IdentityTranslator`] |

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use ferrule_render::{
    DirectoryResolver, HelperRegistry, MiniJinjaEngine, TemplateEngine, TemplateResolver,
};
use serde_json::Map;
use tracing::debug;

use crate::buffer::OutputBuffer;
use crate::composer::ResponseComposer;
use crate::error::ResponseError;
use crate::events::{EventNotifier, Events};
use crate::request::{RequestContext, Route};
use crate::settings::ComposerConfig;
use crate::transport::Transport;
use crate::translate::{IdentityTranslator, Translator};

/// Template directory used when none is configured.
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";

/// Builder for configuring a [`ResponseComposer`].
pub struct ComposerBuilder {
    transport: Box<dyn Transport>,
    config: ComposerConfig,
    template_dir: PathBuf,
    resolver: Option<Arc<dyn TemplateResolver>>,
    engine: Option<Arc<dyn TemplateEngine>>,
    request: Rc<dyn RequestContext>,
    events: Rc<dyn EventNotifier>,
    translator: Rc<dyn Translator>,
}

impl ComposerBuilder {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            config: ComposerConfig::default(),
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            resolver: None,
            engine: None,
            request: Rc::new(Route::default()),
            events: Rc::new(Events::new()),
            translator: Rc::new(IdentityTranslator),
        }
    }

    /// Sets the construction-time configuration.
    pub fn config(mut self, config: ComposerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the directory used by the default resolver and engine.
    ///
    /// Has no effect on a resolver or engine set explicitly.
    pub fn template_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.template_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Sets the template resolver.
    pub fn templates(mut self, resolver: impl TemplateResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the template engine.
    pub fn engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.engine = Some(Arc::new(engine));
        self
    }

    /// Sets the request the default template name is derived from.
    pub fn request(mut self, request: impl RequestContext + 'static) -> Self {
        self.request = Rc::new(request);
        self
    }

    /// Sets the event notifier fired before emission.
    pub fn events(mut self, events: impl EventNotifier + 'static) -> Self {
        self.events = Rc::new(events);
        self
    }

    /// Sets the translator used by `write_translated`.
    pub fn translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Rc::new(translator);
        self
    }

    /// Builds the composer, registering the configured default helpers.
    ///
    /// Fails if a default helper's derived name is empty.
    pub fn build(self) -> Result<ResponseComposer, ResponseError> {
        let mut helpers = HelperRegistry::new();
        for helper in self.config.default_helpers {
            helpers.register_shared(helper)?;
        }

        let template_dir = self.template_dir;
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(DirectoryResolver::new(template_dir.clone())));
        let engine = self
            .engine
            .unwrap_or_else(|| Arc::new(MiniJinjaEngine::with_root(template_dir)));

        debug!(
            deferred = self.config.deferred,
            helpers = helpers.len(),
            "response composer ready"
        );

        Ok(ResponseComposer {
            buffer: OutputBuffer::new(self.config.deferred),
            transport: self.transport,
            template_suppressed: false,
            template: None,
            variables: Map::new(),
            helpers,
            resolver,
            engine,
            request: self.request,
            events: self.events,
            translator: self.translator,
            emitted: false,
        })
    }
}
