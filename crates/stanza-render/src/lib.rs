//! # Stanza Render - Templates with Metadata and Sections
//!
//! `stanza-render` renders text templates (emails, notifications, prompts)
//! into a structured result: the rendered body, the metadata declared in its
//! front matter, and the named sections it is divided into.
//!
//! ## Quick Start
//!
//! ```rust
//! use stanza_render::{RenderRequest, Renderer};
//!
//! let renderer = Renderer::new();
//!
//! let template = "---
//! subject: Welcome, {{ name }}
//! ---
//! === SYSTEM ===
//!
//! You are talking to {{ name }}.
//!
//! === USER ===
//!
//! {{ list(topics) }}";
//!
//! let result = renderer
//!     .render(
//!         RenderRequest::template(template)
//!             .parameter("name", "Carl")
//!             .parameter("topics", vec!["billing", "support"]),
//!     )
//!     .unwrap();
//!
//! assert_eq!(result.meta["subject"], "Welcome, Carl");
//! assert_eq!(result.section("SYSTEM"), Some("You are talking to Carl."));
//! assert_eq!(result.section("USER"), Some("- billing\n- support"));
//! ```
//!
//! ## Core Concepts
//!
//! - [`Renderer`]: owns defaults, helpers and the compiled-template cache
//! - [`RenderRequest`]: one render call; overrides renderer defaults
//! - [`RenderResult`]: `{ body, meta, sections }`
//! - [`helpers`]: functions callable from templates, with explicit parameter
//!   names and URL templating for `url`/`href` arguments
//! - [`markup`]: helper output that renders as inline markup
//!
//! ## Template Files
//!
//! With a template directory configured, an identifier such as `welcome` is
//! looked up as `welcome.md`, then `welcome.txt`. An identifier with an
//! extension is read as-is. When no file matches, the identifier itself is
//! the template.
//!
//! ```rust,ignore
//! let renderer = Renderer::with_options(RenderOptions::new().dir("./templates"));
//! let result = renderer.render(RenderRequest::template("welcome").parameter("name", "Carl"))?;
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (cache misses and file resolution at
//! `debug`, cache hits and helper calls at `trace`). It never installs a
//! subscriber.

pub mod context;
pub mod datetime;
mod error;
pub mod extract;
pub mod helpers;
pub mod markup;
mod options;
pub mod prelude;
pub mod template;

pub use error::RenderError;

pub use context::{AmbientOptions, HelperContext, HelperData};
pub use extract::{extract, split_sections, RenderResult, Section};
pub use helpers::{default_helpers, HelperDescriptor, HelperError, HelperSet};
pub use markup::{Element, HelperOutput};
pub use options::{RenderOptions, RenderRequest};
pub use template::{
    render, render_with_options, CacheKey, CompiledTemplate, FileSourceResolver, MiniJinjaEngine,
    Renderer, RendererBuilder, SourceResolver, TemplateCache, TEMPLATE_EXTENSIONS,
};

// Frontmatter errors surface through RenderError::Metadata.
pub use stanza_frontmatter::FrontMatterError;
