//! The rendering facade.
//!
//! [`Renderer`] owns the renderer-wide defaults, the helper set, the injected
//! services and the compiled-template cache. A render call goes through:
//!
//! 1. merge the [`RenderRequest`] over the defaults,
//! 2. fetch or compile the template through the cache,
//! 3. evaluate it with the merged parameters and helpers,
//! 4. split the output into `meta`, `body` and `sections`.

use std::sync::Arc;

use tracing::debug;

use super::cache::{CacheKey, TemplateCache};
use super::engine::MiniJinjaEngine;
use super::source::{FileSourceResolver, SourceResolver};
use crate::context::AmbientOptions;
use crate::datetime::{ChronoFormatter, Clock, DateTimeFormatter, SystemClock};
use crate::error::RenderError;
use crate::extract::{extract, RenderResult};
use crate::helpers::{adapt_helpers, default_helpers, HelperDescriptor, HelperSet};
use crate::options::{RenderOptions, RenderRequest};

/// Renders templates into [`RenderResult`]s.
///
/// A renderer is `Send + Sync` and meant to be shared. Compiled templates are
/// cached per renderer, keyed by identifier, template directory and escaping
/// mode.
///
/// # Example
///
/// ```rust
/// use stanza_render::{RenderRequest, Renderer};
///
/// let renderer = Renderer::new();
/// let result = renderer
///     .render(RenderRequest::template("Hello {{ name }}!").parameter("name", "Carl"))
///     .unwrap();
///
/// assert_eq!(result.body, "Hello Carl!");
/// assert!(result.meta.is_empty());
/// assert_eq!(result.sections[0].content, "Hello Carl!");
/// ```
pub struct Renderer {
    options: RenderOptions,
    /// Built-ins with the instance helpers layered on top.
    helpers: HelperSet,
    clock: Arc<dyn Clock>,
    formatter: Arc<dyn DateTimeFormatter>,
    resolver: Arc<dyn SourceResolver>,
    cache: TemplateCache,
}

impl Renderer {
    /// Creates a renderer with default options and the built-in helpers.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a renderer with the given defaults.
    pub fn with_options(options: RenderOptions) -> Self {
        Self::builder().options(options).build()
    }

    pub fn builder() -> RendererBuilder {
        RendererBuilder::default()
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Helpers available to every call.
    pub fn helpers(&self) -> &HelperSet {
        &self.helpers
    }

    /// Renders one request.
    ///
    /// A request without `template` or `body` renders to an empty result.
    ///
    /// # Errors
    ///
    /// Fails if the template file cannot be read, does not compile, fails
    /// during evaluation (including helper errors), or produces invalid
    /// front matter. See [`RenderError::stage`].
    pub fn render(&self, request: RenderRequest) -> Result<RenderResult, RenderError> {
        let merged = self.options.merge(request);

        let key = CacheKey::new(merged.template.clone(), merged.dir.clone(), merged.auto_escape);
        let compiled = self.cache.get_or_compile(key, || {
            let source = self
                .resolver
                .resolve(&merged.template, merged.dir.as_deref())?;
            MiniJinjaEngine::with_auto_escape(merged.auto_escape).compile(source.trim())
        })?;

        let ambient = Arc::new(AmbientOptions {
            base_url: merged.base_url,
            dir: merged.dir,
            clock: Arc::clone(&self.clock),
            formatter: Arc::clone(&self.formatter),
        });
        let helpers = if merged.helpers.is_empty() {
            adapt_helpers(&self.helpers, ambient)
        } else {
            adapt_helpers(&self.helpers.overlay(&merged.helpers), ambient)
        };

        let raw = compiled.render(&merged.parameters, helpers)?;
        debug!(bytes = raw.len(), "rendered template");
        extract(&raw)
    }

    /// Number of templates compiled so far.
    pub fn cached_templates(&self) -> usize {
        self.cache.len()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("options", &self.options)
            .field("helpers", &self.helpers)
            .field("cache", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Renderer`].
///
/// ```rust
/// use std::sync::Arc;
/// use stanza_render::{HelperDescriptor, RenderOptions, Renderer};
/// use stanza_render::datetime::FixedClock;
///
/// let renderer = Renderer::builder()
///     .options(RenderOptions::new().base_url("https://example.com"))
///     .clock(Arc::new(FixedClock::parse("2025-01-01T12:00:00Z").unwrap()))
///     .helper(
///         "shout",
///         HelperDescriptor::new(["text"], |args, _| Ok(args[0].to_string().to_uppercase().into()))
///             .unwrap(),
///     )
///     .build();
///
/// assert!(renderer.helpers().contains("shout"));
/// assert!(renderer.helpers().contains("dateLong"));
/// ```
#[derive(Default)]
pub struct RendererBuilder {
    options: RenderOptions,
    helpers: HelperSet,
    clock: Option<Arc<dyn Clock>>,
    formatter: Option<Arc<dyn DateTimeFormatter>>,
    resolver: Option<Arc<dyn SourceResolver>>,
}

impl RendererBuilder {
    pub fn options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds a helper, replacing any built-in of the same name.
    pub fn helper(mut self, name: impl Into<String>, descriptor: HelperDescriptor) -> Self {
        self.helpers.insert(name, descriptor);
        self
    }

    /// Adds several helpers.
    pub fn helpers(mut self, helpers: HelperSet) -> Self {
        self.helpers = self.helpers.overlay(&helpers);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replaces the date formatter. Takes precedence over `time_zone` in
    /// the options.
    pub fn formatter(mut self, formatter: Arc<dyn DateTimeFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn SourceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> Renderer {
        let formatter = self.formatter.unwrap_or_else(|| {
            let zone = self.options.time_zone.clone().unwrap_or_default();
            Arc::new(ChronoFormatter::new(zone))
        });

        Renderer {
            helpers: default_helpers().overlay(&self.helpers),
            options: self.options,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            formatter,
            resolver: self.resolver.unwrap_or_else(|| Arc::new(FileSourceResolver)),
            cache: TemplateCache::new(),
        }
    }
}
