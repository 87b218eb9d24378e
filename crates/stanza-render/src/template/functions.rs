//! One-shot rendering functions.
//!
//! These build a throwaway [`Renderer`], so nothing is cached between calls.
//! Keep a [`Renderer`] around when the same templates are rendered often.

use serde::Serialize;

use super::renderer::Renderer;
use crate::error::RenderError;
use crate::extract::RenderResult;
use crate::options::{RenderOptions, RenderRequest};

/// Renders an inline template with serializable data.
///
/// # Example
///
/// ```rust
/// use serde::Serialize;
/// use stanza_render::render;
///
/// #[derive(Serialize)]
/// struct Data { name: String }
///
/// let result = render(
///     "---\nsubject: Hi\n---\nHello {{ name }}!",
///     &Data { name: "Carl".into() },
/// ).unwrap();
///
/// assert_eq!(result.body, "Hello Carl!");
/// assert_eq!(result.meta["subject"], "Hi");
/// ```
pub fn render<T: Serialize + ?Sized>(template: &str, data: &T) -> Result<RenderResult, RenderError> {
    render_with_options(template, data, RenderOptions::default())
}

/// Renders a template with explicit renderer defaults.
///
/// Use this to resolve `template` against a directory or to set a base URL.
pub fn render_with_options<T: Serialize + ?Sized>(
    template: &str,
    data: &T,
    options: RenderOptions,
) -> Result<RenderResult, RenderError> {
    let request = RenderRequest::template(template).parameters_from(data)?;
    Renderer::with_options(options).render(request)
}
