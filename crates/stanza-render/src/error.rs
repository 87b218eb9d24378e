//! Error types for template rendering.
//!
//! This module provides [`RenderError`], the error type returned by every
//! rendering operation. Each variant names the stage that failed, so callers
//! can tell a missing file apart from a template typo or a failing helper.
//! No partial result is ever returned alongside an error.

use std::error::Error as StdError;

use stanza_frontmatter::FrontMatterError;
use thiserror::Error;

use crate::helpers::{HelperError, HelperFailure};

/// Error type for template rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The template file exists but could not be read.
    ///
    /// A missing file is not an error: the identifier is then used as
    /// literal template source.
    #[error("failed to read template `{template}`: {source}")]
    Resolution {
        /// Identifier the caller asked for.
        template: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Template syntax error.
    #[error("template compilation failed: {0}")]
    Compilation(String),

    /// Failure while evaluating a compiled template.
    #[error("template evaluation failed: {0}")]
    Evaluation(String),

    /// A helper returned an error during evaluation.
    #[error("helper `{name}` failed: {source}")]
    Helper {
        /// Registered helper name.
        name: String,
        /// Error returned by the helper.
        #[source]
        source: HelperError,
    },

    /// The rendered header block could not be parsed.
    #[error("metadata extraction failed: {0}")]
    Metadata(#[from] FrontMatterError),

    /// Invalid renderer or request configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RenderError {
    /// Name of the pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            RenderError::Resolution { .. } => "resolution",
            RenderError::Compilation(_) => "compilation",
            RenderError::Evaluation(_) | RenderError::Helper { .. } => "evaluation",
            RenderError::Metadata(_) => "extraction",
            RenderError::Config(_) => "configuration",
        }
    }

    /// Wraps an engine error raised while compiling source text.
    pub(crate) fn compilation(err: minijinja::Error) -> Self {
        RenderError::Compilation(err.to_string())
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for RenderError {
    fn from(err: serde_yaml::Error) -> Self {
        RenderError::Config(err.to_string())
    }
}

// Helper failures travel through minijinja as the error source; recover them
// here so callers see which helper broke.
impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        if let Some(failure) = find_helper_failure(&err) {
            return RenderError::Helper {
                name: failure.name.clone(),
                source: failure.error.clone(),
            };
        }

        match err.kind() {
            ErrorKind::SyntaxError | ErrorKind::BadEscape | ErrorKind::TemplateNotFound => {
                RenderError::Compilation(err.to_string())
            }
            _ => RenderError::Evaluation(err.to_string()),
        }
    }
}

fn find_helper_failure(err: &minijinja::Error) -> Option<&HelperFailure> {
    let mut source = StdError::source(err);
    while let Some(current) = source {
        if let Some(failure) = current.downcast_ref::<HelperFailure>() {
            return Some(failure);
        }
        source = current.source();
    }
    None
}
