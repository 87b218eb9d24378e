//! Template loading, compilation and rendering.
//!
//! ## Pipeline
//!
//! ```text
//! identifier ──► SourceResolver ──► MiniJinjaEngine ──► TemplateCache
//!                                                          │
//! parameters + helpers ──► CompiledTemplate::render ◄──────┘
//!                                  │
//!                                  ▼
//!                     extract() ──► RenderResult { body, meta, sections }
//! ```
//!
//! Template syntax is Jinja. Helpers are called like functions, with
//! keyword arguments for named values:
//!
//! ```jinja
//! ---
//! subject: Welcome, {{ user.name }}
//! ---
//! === SYSTEM ===
//!
//! Today is {{ dateLong() }}.
//!
//! === USER ===
//!
//! {{ button("/users/:id", "Open profile", id=user.id) }}
//! ```
//!
//! ## Key Types
//!
//! - [`Renderer`]: caching renderer, the main entry point
//! - [`TemplateCache`]: compute-once map of compiled templates
//! - [`SourceResolver`]: how identifiers become source text
//! - [`render`]: one-shot convenience function

mod cache;
mod engine;
mod functions;
mod renderer;
mod source;

pub use cache::{CacheKey, TemplateCache};
pub use engine::{CompiledTemplate, MiniJinjaEngine};
pub use functions::{render, render_with_options};
pub use renderer::{Renderer, RendererBuilder};
pub use source::{is_inline, FileSourceResolver, SourceResolver, TEMPLATE_EXTENSIONS};
