//! Commonly used types in one import:
//!
//! ```rust
//! use stanza_render::prelude::*;
//!
//! let renderer = Renderer::new();
//! let result = renderer.render(RenderRequest::template("Hi {{ who }}").parameter("who", "there"))?;
//! assert_eq!(result.body, "Hi there");
//! # Ok::<(), RenderError>(())
//! ```

// Rendering
pub use crate::options::{RenderOptions, RenderRequest};
pub use crate::template::{render, render_with_options, Renderer, RendererBuilder};
pub use crate::{RenderError, RenderResult, Section};

// Helpers
pub use crate::context::HelperContext;
pub use crate::helpers::{HelperDescriptor, HelperError, HelperSet};
pub use crate::markup::{Element, HelperOutput};

// Time
pub use crate::datetime::{Clock, FixedClock, TimeZoneSpec};
